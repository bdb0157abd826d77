// SPDX-License-Identifier: MIT

use imgio::prelude::*;

use crate::core::checker::*;
use crate::fs::fat32::{allocator::Fat32Allocator, constant::*, meta::*};

pub fn check_reserved_entries<IO: ImgIO + ?Sized>(
    io: &mut IO,
    meta: &Fat32Meta,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    let fat0 = io.read_u32_at(meta.fat_entry_offset(0, 0))? & FAT_MASK;
    let fat1 = io.read_u32_at(meta.fat_entry_offset(1, 0))? & FAT_MASK;
    if fat0 & 0xFF != FAT_MEDIA_DESCRIPTOR as u32 {
        rep.push(Finding::err(
            "FAT.MEDIA",
            format!("FAT[0] = {fat0:08X} does not carry the media byte"),
        ));
    }
    if !meta.is_eoc(fat1) {
        rep.push(Finding::warn("FAT.RSVD", format!("FAT[1] = {fat1:08X}")));
    }
    Ok(())
}

/// Byte-compares every FAT copy with copy 0.
pub fn compare_fat_copies<IO: ImgIO + ?Sized>(
    io: &mut IO,
    meta: &Fat32Meta,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    if meta.num_fats < 2 {
        rep.push(Finding::info("FAT.MIRROR", "Single FAT (no mirror)"));
        return Ok(());
    }

    let fat_bytes = meta.fat_size_bytes();
    let chunk = imgio::BLOCK_BUF_SIZE as u64;
    let mut a = vec![0u8; chunk as usize];
    let mut b = vec![0u8; chunk as usize];

    for copy in 1..meta.num_fats {
        let base = meta.fat_offset_bytes + copy as u64 * fat_bytes;
        let mut pos = 0u64;
        let mut first_diff = None;
        while pos < fat_bytes && first_diff.is_none() {
            let n = chunk.min(fat_bytes - pos) as usize;
            io.read_at(meta.fat_offset_bytes + pos, &mut a[..n])?;
            io.read_at(base + pos, &mut b[..n])?;
            first_diff = a[..n]
                .iter()
                .zip(&b[..n])
                .position(|(x, y)| x != y)
                .map(|i| (pos + i as u64) / FAT_ENTRY_SIZE as u64);
            pos += n as u64;
        }
        match first_diff {
            None => rep.push(Finding::info(
                "FAT.MIRROR",
                format!("FAT copy {copy} matches copy 0"),
            )),
            Some(entry) => rep.push(Finding::err(
                "FAT.MIRROR",
                format!("FAT copy {copy} differs from copy 0 at entry {entry}"),
            )),
        }
    }
    Ok(())
}

/// Clusters marked free in the primary FAT.
pub fn count_free<IO: ImgIO + ?Sized>(io: &mut IO, meta: &Fat32Meta) -> FsCheckerResult<u32> {
    Ok(Fat32Allocator::load(io, meta)?.free_clusters())
}
