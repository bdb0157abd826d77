// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsFormatterError, FsFormatterResult};

use crate::core::meta::FsMeta;
use imgio::prelude::*;

/// Lays down the on-disk structures of an empty filesystem.
///
/// The formatter must perform a *full format* (zero the data region) if
/// `full_format` is `true`, or a quick format otherwise.
pub trait FsFormatter {
    #[must_use = "format result must be checked for errors"]
    fn format(&mut self, full_format: bool) -> FsFormatterResult;

    #[must_use = "flush result must be checked for errors"]
    fn flush(&mut self) -> FsFormatterResult<()> {
        Ok(())
    }
}

/// Zeroes the allocatable data region of a filesystem.
pub fn zero_cluster_heap<M: FsMeta<u32>, IO: ImgIO + ?Sized>(
    io: &mut IO,
    meta: &M,
) -> FsFormatterResult {
    let first = meta.first_data_unit();
    let last = meta.last_data_unit();
    if first > last {
        return Ok(());
    }

    let start = meta.unit_offset(first);
    let end = meta.unit_offset(last) + meta.unit_size() as u64;
    let len = end.saturating_sub(start) as usize;

    io.zero_fill(start, len)?;
    Ok(())
}
