// SPDX-License-Identifier: MIT

use crate::{ImgIO, ImgIOResult};

/// Plain I/O counters.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,

    pub aligned_writes: u64,
    pub unaligned_writes: u64,

    pub max_write: u64,
}

impl IoStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = IoStats::default();
    }
}

/// Transparent instrumentation wrapper.
pub struct IOCounter<'a, IO: ImgIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: IoStats,
    /// Alignment used to classify writes (sector size, cluster size...).
    pub align: u64,
}

impl<'a, IO: ImgIO + ?Sized> IOCounter<'a, IO> {
    #[inline]
    pub fn new(inner: &'a mut IO) -> Self {
        Self::with_align(inner, 1)
    }

    #[inline]
    pub fn with_align(inner: &'a mut IO, align: u64) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
            align: align.max(1),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> IoStats {
        self.stats
    }

    #[inline]
    pub fn into_inner(self) -> &'a mut IO {
        self.inner
    }
}

impl<'a, IO: ImgIO + ?Sized> ImgIO for IOCounter<'a, IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> ImgIOResult {
        let len = data.len() as u64;
        let abs = self.inner.partition_offset() + offset;
        if abs.is_multiple_of(self.align) && len.is_multiple_of(self.align) {
            self.stats.aligned_writes += 1;
        } else {
            self.stats.unaligned_writes += 1;
        }
        self.stats.writes += 1;
        self.stats.write_bytes += len;
        self.stats.max_write = self.stats.max_write.max(len);

        self.inner.write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImgIOResult {
        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;
        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> ImgIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }

    #[inline]
    fn set_offset(&mut self, p: u64) -> u64 {
        self.inner.set_offset(p)
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.inner.partition_offset()
    }

    #[inline]
    fn size_bytes(&mut self) -> ImgIOResult<u64> {
        self.inner.size_bytes()
    }
}
