// SPDX-License-Identifier: MIT

//! Writing and resolving the single-partition MBR table of a disk image.

use crate::errors::*;
use crate::geometry::PartitionPlan;
use crate::kinds::MBR_TYPE_FAT32_CHS;
use crate::mbr::*;
use imgio::prelude::*;

/// Byte span of a resolved partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSpan {
    pub index: usize,
    pub entry: MbrEntry,
    pub offset_bytes: u64,
    pub size_bytes: u64,
}

fn to_u32(value: u64) -> PartResult<u32> {
    u32::try_from(value).map_err(|_| PartError::LbaOverflow { value })
}

/// Writes an MBR holding one FAT32 (CHS) entry at slot 1 that spans
/// `plan.start_sector..plan.start_sector + plan.size_sectors`.
///
/// `io` must address the whole disk (partition offset 0) and be at least as
/// large as the partition end.
pub fn partition<IO: ImgIO + ?Sized>(
    io: &mut IO,
    plan: &PartitionPlan,
    disk_signature: u32,
) -> PartResult<MbrEntry> {
    if io.partition_offset() != 0 {
        return Err(PartError::Invalid(
            "partition table must be written at disk offset 0",
        ));
    }

    let available = io.size_bytes()?;
    let needed = plan.sector_size.max(plan.start_bytes() + plan.size_bytes());
    if available < needed {
        return Err(PartError::TooSmall { needed, available });
    }

    let start = to_u32(plan.start_sector)?;
    let sectors = to_u32(plan.size_sectors)?;
    to_u32(plan.end_sector())?;

    let entry = MbrEntry::new_span(MBR_TYPE_FAT32_CHS, start, sectors)?;
    let mut entries = [MbrEntry::new_empty(); 4];
    entries[0] = entry;

    let mbr = Mbr::new_from_entries(entries, disk_signature);
    mbr.validate_legacy()?;
    write_mbr(io, &mbr, plan.sector_size)?;
    Ok(entry)
}

/// Reads the MBR and resolves the 1-based partition `index`.
pub fn locate_partition<IO: ImgIO + ?Sized>(
    io: &mut IO,
    index: usize,
    sector_size: u64,
) -> PartResult<PartitionSpan> {
    let mbr = read_mbr(io, sector_size)?;
    mbr.validate_legacy()?;
    let entry = mbr.entry(index)?;

    let span = PartitionSpan {
        index,
        entry,
        offset_bytes: entry.start_bytes(sector_size),
        size_bytes: entry.size_bytes(sector_size),
    };

    let available = io.size_bytes()?;
    let needed = span.offset_bytes + span.size_bytes;
    if available < needed {
        return Err(PartError::TooSmall { needed, available });
    }
    Ok(span)
}
