// SPDX-License-Identifier: MIT

//! LBA-addressed ImgIO helpers, so callers never multiply by the sector
//! size by hand.

use imgio::prelude::*;

/// Offset = LBA * sector_size, overflow-checked.
#[inline]
fn lba_offset(lba: u64, sector_size: u64) -> ImgIOResult<u64> {
    lba.checked_mul(sector_size)
        .ok_or(ImgIOError::Invalid("lba_offset overflow"))
}

pub trait ImgIOLbaExt: ImgIO {
    #[inline]
    fn read_at_lba(&mut self, lba: u64, sector_size: u64, buf: &mut [u8]) -> ImgIOResult {
        let off = lba_offset(lba, sector_size)?;
        self.read_at(off, buf)
    }

    #[inline]
    fn write_at_lba(&mut self, lba: u64, sector_size: u64, data: &[u8]) -> ImgIOResult {
        let off = lba_offset(lba, sector_size)?;
        self.write_at(off, data)
    }

    #[inline]
    fn read_struct_lba<T>(&mut self, lba: u64, sector_size: u64) -> ImgIOResult<T>
    where
        T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable,
    {
        let off = lba_offset(lba, sector_size)?;
        self.read_struct::<T>(off)
    }

    #[inline]
    fn write_struct_lba<T>(&mut self, lba: u64, sector_size: u64, val: &T) -> ImgIOResult
    where
        T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable,
    {
        let off = lba_offset(lba, sector_size)?;
        self.write_struct::<T>(off, val)
    }
}

impl<T: ImgIO + ?Sized> ImgIOLbaExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lba_addressing() {
        let mut buf = vec![0u8; 4096];
        let mut io = MemImgIO::new(&mut buf);
        io.write_at_lba(3, 512, &[0x5A; 4]).unwrap();

        let mut out = [0u8; 4];
        io.read_at(3 * 512, &mut out).unwrap();
        assert_eq!(out, [0x5A; 4]);

        let mut back = [0u8; 4];
        io.read_at_lba(3, 512, &mut back).unwrap();
        assert_eq!(back, out);
    }

    #[test]
    fn lba_overflow_is_rejected() {
        let mut buf = vec![0u8; 512];
        let mut io = MemImgIO::new(&mut buf);
        assert!(matches!(
            io.write_at_lba(u64::MAX, 512, &[0]),
            Err(ImgIOError::Invalid(_))
        ));
    }
}
