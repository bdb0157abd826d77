// SPDX-License-Identifier: MIT

use std::io::{Read, Seek, SeekFrom, Write};

use crate::{ImgIO, ImgIOResult, ImgIOSetLen};

/// [`ImgIO`] over any seekable std stream (files, cursors).
#[derive(Debug)]
pub struct StdImgIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    partition_offset: u64,
}

impl<'a, T: Read + Write + Seek> StdImgIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self {
            io,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(io: &'a mut T, partition_offset: u64) -> Self {
        Self {
            io,
            partition_offset,
        }
    }
}

impl<'a, T: Read + Write + Seek> ImgIO for StdImgIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> ImgIOResult {
        self.io
            .seek(SeekFrom::Start(self.partition_offset + offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImgIOResult {
        self.io
            .seek(SeekFrom::Start(self.partition_offset + offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> ImgIOResult {
        self.io.flush()?;
        Ok(())
    }

    #[inline]
    fn set_offset(&mut self, partition_offset: u64) -> u64 {
        self.partition_offset = partition_offset;
        partition_offset
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }

    fn size_bytes(&mut self) -> ImgIOResult<u64> {
        Ok(self.io.seek(SeekFrom::End(0))?)
    }
}

impl<'a> ImgIOSetLen for StdImgIO<'a, std::fs::File> {
    fn set_len(&mut self, len: u64) -> ImgIOResult {
        self.io.set_len(self.partition_offset + len)?;
        self.flush()?;
        self.io.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use tempfile::tempfile;

    #[test]
    fn test_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdImgIO::new(&mut file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_set_len_and_size() {
        let mut file = tempfile().unwrap();
        let mut io = StdImgIO::new(&mut file);

        io.set_len(512 * 8).unwrap();
        assert_eq!(io.size_bytes().unwrap(), 4096);
        assert!(io.set_len(u64::MAX).is_err());
    }

    #[test]
    fn test_offset_is_applied() {
        let mut file = tempfile().unwrap();
        let mut io = StdImgIO::new(&mut file);
        io.set_len(4096).unwrap();

        io.set_offset(1024);
        io.write_u32_at(0, 0xDEAD_BEEF).unwrap();

        io.set_offset(0);
        assert_eq!(io.read_u32_at(1024).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_read_past_end_is_io_error() {
        let mut file = tempfile().unwrap();
        let mut io = StdImgIO::new(&mut file);
        io.set_len(16).unwrap();

        let mut buf = [0u8; 32];
        let err = io.read_at(0, &mut buf).unwrap_err();
        assert!(err.is_host_io());
    }

    #[test]
    fn test_multi_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdImgIO::new(&mut file);

        let input = [0xCD; 32];
        let mut output = [0u8; 32];
        let offsets = [0u64, 8, 24, 32];

        io.write_multi_at(&offsets, 8, &input).unwrap();
        io.read_multi_at(&offsets, 8, &mut output).unwrap();

        assert_eq!(input, output);
    }

    #[test]
    fn test_zero_fill() {
        let mut file = tempfile().unwrap();
        let mut io = StdImgIO::new(&mut file);

        io.write_at(42, &[0xFF; 8]).unwrap();
        io.zero_fill(42, 8).unwrap();

        let mut buf = [0xAA; 8];
        io.read_at(42, &mut buf).unwrap();

        assert_eq!(buf, [0u8; 8]);
    }
}
