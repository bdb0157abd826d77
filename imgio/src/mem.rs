// SPDX-License-Identifier: MIT

use crate::{ImgIO, ImgIOError, ImgIOResult, ImgIOSetLen};

/// In-memory [`ImgIO`] over a borrowed byte slice.
///
/// Used by the filesystem unit tests and benches.
#[derive(Debug)]
pub struct MemImgIO<'a> {
    buffer: &'a mut [u8],
    partition_offset: u64,
    logical_len: usize,
}

impl<'a> MemImgIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let logical_len = buffer.len();
        Self {
            buffer,
            logical_len,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(buffer: &'a mut [u8], partition_offset: u64) -> Self {
        let logical_len = buffer.len();
        Self {
            buffer,
            logical_len,
            partition_offset,
        }
    }

    #[inline]
    fn check_bounds(&self, abs_off: u64, len: usize) -> ImgIOResult<usize> {
        let oob = ImgIOError::OutOfBounds {
            offset: abs_off,
            len: len as u64,
            capacity: self.logical_len as u64,
        };
        match abs_off.checked_add(len as u64) {
            Some(end) if end <= self.logical_len as u64 => Ok(abs_off as usize),
            _ => Err(oob),
        }
    }
}

impl<'a> ImgIO for MemImgIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> ImgIOResult {
        let start = self.check_bounds(self.partition_offset + offset, data.len())?;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImgIOResult {
        let start = self.check_bounds(self.partition_offset + offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> ImgIOResult {
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

    #[inline]
    fn size_bytes(&mut self) -> ImgIOResult<u64> {
        Ok(self.logical_len as u64)
    }

    /// Single copy: reads from `src` straight into the backing slice.
    fn copy_from(
        &mut self,
        src: &mut dyn ImgIO,
        src_offset: u64,
        dest_offset: u64,
        len: u64,
    ) -> ImgIOResult {
        let len = len as usize;
        let start = self.check_bounds(self.partition_offset + dest_offset, len)?;
        src.read_at(src_offset, &mut self.buffer[start..start + len])
    }
}

impl<'a> ImgIOSetLen for MemImgIO<'a> {
    /// Shrinks or regrows the logical length within the borrowed slice.
    fn set_len(&mut self, new_len: u64) -> ImgIOResult {
        let end = self.partition_offset.checked_add(new_len);
        match end {
            Some(end) if end <= self.buffer.len() as u64 => {
                self.logical_len = end as usize;
                Ok(())
            }
            _ => Err(ImgIOError::OutOfBounds {
                offset: self.partition_offset,
                len: new_len,
                capacity: self.buffer.len() as u64,
            }),
        }
    }
}
