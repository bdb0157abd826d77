// SPDX-License-Identifier: MIT

//! Volume identifiers and FAT layout arithmetic.

/// Content-derived 32-bit identifier (CRC-32/ISO-HDLC of `data`).
///
/// Used for the FAT volume serial number so that identical payloads yield
/// identical images.
pub fn volume_id_from_bytes(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// FAT size (sectors per FAT) and data cluster count for a volume.
///
/// The FAT is grown until it can address every cluster that remains once
/// the reserved region and all FAT copies are carved out, so the returned
/// `fat_size` always holds `cluster_count + min_entries` entries.
pub fn converge_fat_layout(
    sector_size: u32,
    total_sectors: u64,
    reserved_sectors: u32,
    entry_size: u32,
    min_entries: u32,
    num_fats: u8,
    sectors_per_cluster: u32,
) -> (u32, u32) {
    debug_assert!(sector_size != 0 && sectors_per_cluster != 0);
    let spc = sectors_per_cluster as u64;
    let data_clusters = |fat_size: u64| {
        total_sectors
            .saturating_sub(reserved_sectors as u64)
            .saturating_sub(fat_size * num_fats as u64)
            / spc
    };

    let fits = |fat_size: u64| {
        (data_clusters(fat_size) + min_entries as u64) * entry_size as u64
            <= fat_size * sector_size as u64
    };

    // grow until the FAT covers the clusters left after it
    let mut fat_size = 0u64;
    loop {
        let clusters = data_clusters(fat_size);
        let needed = ((clusters + min_entries as u64) * entry_size as u64)
            .div_ceil(sector_size as u64);
        if needed <= fat_size {
            break;
        }
        fat_size = needed;
    }
    // then give back the sectors the first estimate over-reserved
    while fat_size > 1 && fits(fat_size - 1) {
        fat_size -= 1;
    }

    let clusters = data_clusters(fat_size).min(u32::MAX as u64);
    (fat_size.min(u32::MAX as u64) as u32, clusters as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_id_is_crc32() {
        assert_eq!(volume_id_from_bytes(b"123456789"), 0xCBF4_3926);
        assert_eq!(volume_id_from_bytes(b""), 0);
    }

    #[test]
    fn layout_for_33_mib_with_512_byte_clusters() {
        let total = 33 * 1024 * 1024 / 512;
        let (fat, clusters) = converge_fat_layout(512, total, 32, 4, 2, 2, 1);
        assert!(clusters >= 65_525, "got {clusters} clusters");
        assert!((clusters as u64 + 2) * 4 <= fat as u64 * 512);
        assert_eq!(
            clusters as u64,
            total - 32 - 2 * fat as u64,
            "every data sector is a cluster"
        );
    }

    #[test]
    fn layout_is_minimal_enough() {
        let total = 1024 * 1024 * 1024 / 512;
        let (fat, clusters) = converge_fat_layout(512, total, 32, 4, 2, 2, 8);
        let entries_per_sector = 512 / 4;
        // at most one spare FAT sector per copy
        assert!(fat as u64 * entries_per_sector - (clusters as u64 + 2) < 2 * entries_per_sector);
    }

    #[test]
    fn tiny_volume_has_no_clusters() {
        assert_eq!(converge_fat_layout(512, 10, 32, 4, 2, 2, 1).1, 0);
    }
}
