// SPDX-License-Identifier: MIT

// Core modules
pub mod errors;
#[macro_use]
mod macros;
pub mod stats;

// Backend modules
#[cfg(any(feature = "mem", test))]
mod mem;
mod file;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::ImgIO;
    pub use super::ImgIOExt;
    pub use super::ImgIOSetLen;
    pub use super::ImgIOStreamExt;
    pub use super::ImgIOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(any(feature = "mem", test))]
    pub use super::mem::MemImgIO;

    pub use super::file::StdImgIO;
}

// Internal use
use errors::*;

/// Scratch buffer size for chunked and streamed operations (one page).
pub const BLOCK_BUF_SIZE: usize = 4096;

/// Byte-addressed image I/O.
///
/// Offsets passed to `read_at`/`write_at` are relative to the current
/// partition offset, which lets a filesystem driver address its volume from
/// zero while the backend still targets the whole disk image.
pub trait ImgIO {
    /// Writes `data` at `offset`.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> ImgIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImgIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> ImgIOResult;

    /// Rebases subsequent accesses; returns the new offset.
    fn set_offset(&mut self, partition_offset: u64) -> u64;

    fn partition_offset(&self) -> u64;

    /// Total length of the backing store in bytes, ignoring the partition offset.
    fn size_bytes(&mut self) -> ImgIOResult<u64>;

    /// Copies `len` bytes from `src` into this IO through a heap buffer.
    fn copy_from(
        &mut self,
        src: &mut dyn ImgIO,
        src_offset: u64,
        dest_offset: u64,
        mut len: u64,
    ) -> ImgIOResult {
        const CHUNK_SIZE: usize = 64 * 1024;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut s_off = src_offset;
        let mut d_off = dest_offset;

        while len > 0 {
            let n = len.min(CHUNK_SIZE as u64) as usize;
            src.read_at(s_off, &mut buf[..n])?;
            self.write_at(d_off, &buf[..n])?;

            len -= n as u64;
            s_off += n as u64;
            d_off += n as u64;
        }
        Ok(())
    }
}

/// Convenience helpers layered over [`ImgIO`].
pub trait ImgIOExt: ImgIO {
    /// Reads `buf.len()` bytes from `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn read_in_chunks(&mut self, offset: u64, buf: &mut [u8], chunk_size: usize) -> ImgIOResult {
        if chunk_size == 0 {
            return Err(ImgIOError::Invalid("read_in_chunks: zero chunk size"));
        }
        let mut off = offset;
        for chunk in buf.chunks_mut(chunk_size) {
            self.read_at(off, chunk)?;
            off += chunk.len() as u64;
        }
        Ok(())
    }

    /// Writes `buf` at `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn write_in_chunks(&mut self, offset: u64, buf: &[u8], chunk_size: usize) -> ImgIOResult {
        if chunk_size == 0 {
            return Err(ImgIOError::Invalid("write_in_chunks: zero chunk size"));
        }
        let mut off = offset;
        for chunk in buf.chunks(chunk_size) {
            self.write_at(off, chunk)?;
            off += chunk.len() as u64;
        }
        Ok(())
    }

    /// Single read when `offset` and `buf` are `block_size` aligned,
    /// page-sized chunks otherwise.
    #[inline(always)]
    fn read_block_best_effort(
        &mut self,
        offset: u64,
        buf: &mut [u8],
        block_size: usize,
    ) -> ImgIOResult {
        if offset.is_multiple_of(block_size as u64) && buf.len().is_multiple_of(block_size) {
            self.read_at(offset, buf)
        } else {
            self.read_in_chunks(offset, buf, BLOCK_BUF_SIZE)
        }
    }

    /// Write counterpart of [`ImgIOExt::read_block_best_effort`].
    #[inline(always)]
    fn write_block_best_effort(
        &mut self,
        offset: u64,
        buf: &[u8],
        block_size: usize,
    ) -> ImgIOResult {
        if offset.is_multiple_of(block_size as u64) && buf.len().is_multiple_of(block_size) {
            self.write_at(offset, buf)
        } else {
            self.write_in_chunks(offset, buf, BLOCK_BUF_SIZE)
        }
    }

    /// Reads one `unit`-sized slot per offset into `buf`, coalescing
    /// contiguous offsets into a single transaction.
    ///
    /// # Errors
    /// `ImgIOError::Invalid` if `buf.len() != offsets.len() * unit`.
    fn read_multi_at(&mut self, offsets: &[u64], unit: usize, buf: &mut [u8]) -> ImgIOResult {
        if buf.len() != offsets.len() * unit {
            return Err(ImgIOError::Invalid("read_multi_at: buffer length mismatch"));
        }
        for (idx, run) in contiguous_runs(offsets, unit) {
            let start = idx * unit;
            self.read_at(offsets[idx], &mut buf[start..start + run * unit])?;
        }
        Ok(())
    }

    /// Write counterpart of [`ImgIOExt::read_multi_at`].
    ///
    /// # Errors
    /// `ImgIOError::Invalid` if `buf.len() != offsets.len() * unit`.
    fn write_multi_at(&mut self, offsets: &[u64], unit: usize, buf: &[u8]) -> ImgIOResult {
        if buf.len() != offsets.len() * unit {
            return Err(ImgIOError::Invalid(
                "write_multi_at: buffer length mismatch",
            ));
        }
        for (idx, run) in contiguous_runs(offsets, unit) {
            let start = idx * unit;
            self.write_at(offsets[idx], &buf[start..start + run * unit])?;
        }
        Ok(())
    }

    /// Fills a region with zeroes.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> ImgIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    imgio_impl_primitive_rw!(u16, u32, u64);
}

impl<T: ImgIO + ?Sized> ImgIOExt for T {}

/// Splits `offsets` into `(first_index, run_len)` groups of adjacent units.
fn contiguous_runs(offsets: &[u64], unit: usize) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for (i, &off) in offsets.iter().enumerate() {
        match runs.last_mut() {
            Some((start, len)) if offsets[*start] + (*len * unit) as u64 == off => *len += 1,
            _ => runs.push((i, 1)),
        }
    }
    runs
}

/// Streams fixed-size records (FAT entries, directory slots) through a
/// reusable buffer.
pub trait ImgIOStreamExt: ImgIO {
    /// Calls `f(index, record)` for `count` consecutive `N`-byte records,
    /// reading `chunk` records at a time.
    fn read_chunks_streamed<const N: usize, F>(
        &mut self,
        offset: u64,
        count: usize,
        chunk: usize,
        f: F,
    ) -> ImgIOResult
    where
        F: FnMut(usize, &[u8; N]);

    /// Writes `count` consecutive `N`-byte records produced by `f(index)`.
    fn write_chunks_streamed<const N: usize, F>(
        &mut self,
        offset: u64,
        count: usize,
        chunk: usize,
        f: F,
    ) -> ImgIOResult
    where
        F: FnMut(usize) -> [u8; N];
}

impl<T: ImgIO + ?Sized> ImgIOStreamExt for T {
    fn read_chunks_streamed<const N: usize, F>(
        &mut self,
        offset: u64,
        count: usize,
        chunk: usize,
        mut f: F,
    ) -> ImgIOResult
    where
        F: FnMut(usize, &[u8; N]),
    {
        if chunk == 0 {
            return Err(ImgIOError::Invalid("read_chunks_streamed: zero chunk"));
        }
        let mut buf = vec![0u8; chunk * N];
        let mut remaining = count;
        let mut current = offset;
        let mut index = 0;

        while remaining > 0 {
            let n = remaining.min(chunk);
            let bytes = n * N;
            self.read_in_chunks(current, &mut buf[..bytes], BLOCK_BUF_SIZE)?;

            for rec in buf[..bytes].chunks_exact(N) {
                let mut arr = [0u8; N];
                arr.copy_from_slice(rec);
                f(index, &arr);
                index += 1;
            }

            current += bytes as u64;
            remaining -= n;
        }
        Ok(())
    }

    fn write_chunks_streamed<const N: usize, F>(
        &mut self,
        offset: u64,
        count: usize,
        chunk: usize,
        mut f: F,
    ) -> ImgIOResult
    where
        F: FnMut(usize) -> [u8; N],
    {
        if chunk == 0 {
            return Err(ImgIOError::Invalid("write_chunks_streamed: zero chunk"));
        }
        let mut buf = vec![0u8; chunk * N];
        let mut remaining = count;
        let mut current = offset;
        let mut index = 0;

        while remaining > 0 {
            let n = remaining.min(chunk);
            let bytes = n * N;
            for slot in buf[..bytes].chunks_exact_mut(N) {
                slot.copy_from_slice(&f(index));
                index += 1;
            }
            self.write_in_chunks(current, &buf[..bytes], BLOCK_BUF_SIZE)?;

            current += bytes as u64;
            remaining -= n;
        }
        Ok(())
    }
}

/// Resizable backing stores.
pub trait ImgIOSetLen: ImgIO {
    /// Sets the length of the storage, relative to the partition offset.
    fn set_len(&mut self, len: u64) -> ImgIOResult;
}

/// zerocopy-backed struct reads and writes.
pub trait ImgIOStructExt: ImgIO {
    /// Reads a `T` from `offset`.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> ImgIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(ImgIOError::Invalid("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| ImgIOError::Invalid("read_struct failed"))
    }

    /// Writes `val` at `offset`.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> ImgIOResult {
        self.write_at(offset, val.as_bytes())
    }
}

impl<T: ImgIO + ?Sized> ImgIOStructExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_coalesce_adjacent_offsets() {
        let runs = contiguous_runs(&[0, 8, 16, 40, 48, 100], 8);
        assert_eq!(runs, vec![(0, 3), (3, 2), (5, 1)]);
    }

    #[test]
    fn runs_of_empty_offsets() {
        assert!(contiguous_runs(&[], 512).is_empty());
    }
}
