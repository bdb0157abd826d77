// SPDX-License-Identifier: MIT

//! Partition geometry: where the single data partition starts and how many
//! sectors it spans.

use core::fmt;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;

/// Partition start alignment.
pub const PARTITION_ALIGN_BYTES: u64 = MIB;

/// Smallest partition for which a FAT32 formatter yields at least 65 525
/// clusters with 512-byte clusters.
pub const FAT32_MIN_PARTITION_BYTES: u64 = 33 * MIB;

/// Sector layout of a single-partition disk.
///
/// `start_sector * sector_size` is a multiple of 1 MiB and
/// `total_disk_sectors == start_sector + size_sectors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPlan {
    pub sector_size: u64,
    pub start_sector: u64,
    pub size_sectors: u64,
    pub total_disk_sectors: u64,
}

impl PartitionPlan {
    #[inline]
    pub fn start_bytes(&self) -> u64 {
        self.start_sector * self.sector_size
    }

    #[inline]
    pub fn size_bytes(&self) -> u64 {
        self.size_sectors * self.sector_size
    }

    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.total_disk_sectors * self.sector_size
    }

    /// Last sector of the partition (inclusive).
    #[inline]
    pub fn end_sector(&self) -> u64 {
        (self.start_sector + self.size_sectors).saturating_sub(1)
    }
}

impl fmt::Display for PartitionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partition LBA {}..={} ({} sectors), disk {} sectors of {} B",
            self.start_sector,
            self.end_sector(),
            self.size_sectors,
            self.total_disk_sectors,
            self.sector_size
        )
    }
}

/// Rounds `lba` up to the next multiple of `align` sectors.
#[inline]
pub fn align_up(lba: u64, align: u64) -> u64 {
    if align <= 1 {
        lba
    } else {
        lba.div_ceil(align) * align
    }
}

/// Number of sectors in one MiB, rounded up.
#[inline]
pub fn align_lba_1m(sector_size: u64) -> u64 {
    PARTITION_ALIGN_BYTES.div_ceil(sector_size)
}

/// Computes the partition layout for a payload of `source_len` bytes.
///
/// The partition size is `max(33 MiB, source_len) / sector_size` with floor
/// division, so a payload that is not a sector multiple may exceed the
/// partition by up to `sector_size - 1` bytes.
pub fn plan(source_len: u64, sector_size: u64) -> PartitionPlan {
    debug_assert!(sector_size > 0, "sector_size must be > 0");

    let start_sector = align_lba_1m(sector_size);
    let min_partition_bytes = source_len.max(FAT32_MIN_PARTITION_BYTES);
    let size_sectors = min_partition_bytes / sector_size;

    PartitionPlan {
        sector_size,
        start_sector,
        size_sectors,
        total_disk_sectors: start_sector + size_sectors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_SECTOR_SIZE as SS;

    #[test]
    fn start_is_one_mib() {
        for len in [0, 10, 33 * MIB, 100 * MIB + 7] {
            let p = plan(len, SS);
            assert_eq!(p.start_sector, 2048);
            assert_eq!(p.start_bytes() % MIB, 0);
            assert_eq!(p.start_bytes(), MIB);
        }
    }

    #[test]
    fn small_payload_gets_minimum() {
        let p = plan(10, SS);
        assert_eq!(p.size_sectors, 67_584);
        assert_eq!(p.total_disk_sectors, 2048 + 67_584);
        assert!(p.size_bytes() >= FAT32_MIN_PARTITION_BYTES);
        assert_eq!(p.total_bytes(), (2048 + 67_584) * 512);
    }

    #[test]
    fn exact_minimum_and_below() {
        assert_eq!(plan(33 * MIB, SS).size_sectors, 67_584);
        assert_eq!(plan(33 * MIB - 1, SS).size_sectors, 67_584);
        assert_eq!(plan(0, SS).size_sectors, 67_584);
    }

    #[test]
    fn large_payload_floor_division() {
        for len in [33 * MIB + 1, 40 * MIB, 40 * MIB + 511, 512 * MIB + 3] {
            let p = plan(len, SS);
            assert_eq!(p.size_sectors, len / SS);
            assert!(p.size_sectors * SS + (SS - 1) >= len);
            assert_eq!(p.total_disk_sectors, p.start_sector + p.size_sectors);
        }
    }

    #[test]
    fn other_sector_sizes() {
        let p = plan(10, 4096);
        assert_eq!(p.start_sector, 256);
        assert_eq!(p.start_bytes(), MIB);
        assert_eq!(p.size_sectors, 33 * MIB / 4096);

        // sector sizes that do not divide 1 MiB round up
        assert_eq!(align_lba_1m(1000), 1049);
    }

    #[test]
    fn align_helpers() {
        assert_eq!(align_up(0, 2048), 0);
        assert_eq!(align_up(1, 2048), 2048);
        assert_eq!(align_up(2048, 2048), 2048);
        assert_eq!(align_up(5, 1), 5);
    }

    #[test]
    fn display_mentions_range() {
        let s = plan(10, SS).to_string();
        assert!(s.contains("2048..=69631"));
    }
}
