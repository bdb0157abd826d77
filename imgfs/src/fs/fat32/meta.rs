// SPDX-License-Identifier: MIT

pub use crate::core::fat::ClusterMeta;
pub use crate::core::meta::*;

use crate::core::errors::*;
use crate::fs::fat32::{constant::*, types::Fat32Vbr};

/// Knobs for [`Fat32Meta::from_params`]; `Default` gives a 512-byte-sector,
/// 2-FAT volume with no label, serial 0 and no hidden sectors.
#[derive(Debug, Clone, Copy)]
pub struct Fat32Params<'a> {
    pub volume_label: Option<&'a str>,
    pub volume_id: u32,
    /// Sectors preceding the volume on the disk (its partition start LBA).
    pub hidden_sectors: u32,
    pub bytes_per_sector: u16,
    /// `None` picks the size from [`FAT_CLUSTER_SIZE_TABLE`].
    pub bytes_per_cluster: Option<u32>,
    pub reserved_sectors: u16,
    pub num_fats: u8,
}

impl Default for Fat32Params<'_> {
    fn default() -> Self {
        Self {
            volume_label: None,
            volume_id: 0,
            hidden_sectors: 0,
            bytes_per_sector: FAT_SECTOR_SIZE,
            bytes_per_cluster: None,
            reserved_sectors: DEFAULT_FAT_RESERVED_SECTORS,
            num_fats: FAT_NUM_FATS,
        }
    }
}

impl<'a> Fat32Params<'a> {
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.volume_label = Some(label);
        self
    }

    pub fn with_volume_id(mut self, id: u32) -> Self {
        self.volume_id = id;
        self
    }

    pub fn with_hidden_sectors(mut self, sectors: u32) -> Self {
        self.hidden_sectors = sectors;
        self
    }

    pub fn with_cluster_size(mut self, bytes: u32) -> Self {
        self.bytes_per_cluster = Some(bytes);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fat32Meta {
    pub volume_id: u32,
    pub volume_label: [u8; 11],

    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub bytes_per_cluster: u32,

    pub volume_size_bytes: u64,
    pub volume_size_sectors: u32,
    pub hidden_sectors: u32,

    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub fat_offset_bytes: u64,
    pub fat_size_sectors: u32,

    pub cluster_heap_offset: u64,
    pub cluster_count: u32,

    root_cluster: u32,
}

impl Fat32Meta {
    /// Geometry for a fresh volume of `size_bytes` with default parameters.
    pub fn new(size_bytes: u64, volume_label: Option<&str>) -> FsFormatterResult<Self> {
        Self::from_params(
            size_bytes,
            &Fat32Params {
                volume_label,
                ..Default::default()
            },
        )
    }

    /// Geometry for a fresh volume of `volume_size_bytes`.
    ///
    /// The label is validated first so a bad label never reaches the disk.
    pub fn from_params(volume_size_bytes: u64, p: &Fat32Params<'_>) -> FsFormatterResult<Self> {
        let volume_label = match p.volume_label {
            Some(label) => encode_volume_label(label)?,
            None => *FAT_VOLUME_LABEL_EMPTY,
        };

        let bps = p.bytes_per_sector;
        crate::ensure!(
            bps.is_power_of_two() && (512..=FAT_MAX_SECTOR_SIZE as u16).contains(&bps),
            FsFormatterError::Invalid("sector size must be a power of two in 512..=4096")
        );
        crate::ensure!(p.num_fats > 0, FsFormatterError::Invalid("at least one FAT"));
        crate::ensure!(
            p.reserved_sectors as u64 > FAT_FSINFO_BACKUP_SECTOR,
            FsFormatterError::Invalid("reserved region must hold the backup boot sectors")
        );

        let bytes_per_cluster = p
            .bytes_per_cluster
            .unwrap_or_else(|| cluster_size_for(volume_size_bytes));
        let spc = bytes_per_cluster / bps as u32;
        crate::ensure!(
            bytes_per_cluster % bps as u32 == 0 && spc.is_power_of_two() && spc <= 128,
            FsFormatterError::Invalid("cluster size must be 1..=128 sectors, a power of two")
        );

        let volume_size_sectors = u32::try_from(volume_size_bytes / bps as u64)
            .map_err(|_| FsFormatterError::Invalid("volume exceeds 2^32 sectors"))?;

        let (fat_size_sectors, cluster_count) = converge_fat_layout(
            bps as u32,
            volume_size_sectors as u64,
            p.reserved_sectors as u32,
            FAT_ENTRY_SIZE as u32,
            FAT_FIRST_CLUSTER,
            p.num_fats,
            spc,
        );

        if cluster_count < FAT32_MIN_CLUSTERS {
            return Err(FsFormatterError::TooSmall {
                clusters: cluster_count,
                min: FAT32_MIN_CLUSTERS,
            });
        }
        crate::ensure!(
            cluster_count <= FAT32_MAX_CLUSTERS,
            FsFormatterError::Invalid("too many clusters for FAT32")
        );

        let fat_offset_bytes = p.reserved_sectors as u64 * bps as u64;
        let cluster_heap_offset =
            fat_offset_bytes + fat_size_sectors as u64 * p.num_fats as u64 * bps as u64;

        Ok(Self {
            volume_id: p.volume_id,
            volume_label,
            bytes_per_sector: bps,
            sectors_per_cluster: spc as u8,
            bytes_per_cluster,
            volume_size_bytes,
            volume_size_sectors,
            hidden_sectors: p.hidden_sectors,
            reserved_sectors: p.reserved_sectors,
            num_fats: p.num_fats,
            fat_offset_bytes,
            fat_size_sectors,
            cluster_heap_offset,
            cluster_count,
            root_cluster: FAT_ROOT_CLUSTER,
        })
    }

    /// Geometry of an existing volume, read from its boot sector.
    pub fn from_vbr(vbr: &Fat32Vbr) -> FsParsingResult<Self> {
        let bps = vbr.bytes_per_sector;
        let spc = vbr.sectors_per_cluster;
        let reserved = vbr.reserved_sectors;
        let num_fats = vbr.num_fats;
        let fat_size = vbr.fat_size_32;
        let total = vbr.total_sectors_32;
        let root = vbr.root_cluster;
        let signature = vbr.signature;
        let fat_size_16 = vbr.fat_size_16;
        let root_entries = vbr.root_entry_count;

        crate::ensure!(
            signature == FAT_SIGNATURE,
            FsParsingError::Invalid("boot sector signature missing")
        );
        crate::ensure!(
            bps.is_power_of_two() && (512..=FAT_MAX_SECTOR_SIZE as u16).contains(&bps),
            FsParsingError::Invalid("bad bytes per sector")
        );
        crate::ensure!(
            spc.is_power_of_two(),
            FsParsingError::Invalid("bad sectors per cluster")
        );
        crate::ensure!(
            fat_size_16 == 0 && root_entries == 0 && fat_size != 0,
            FsParsingError::Invalid("not a FAT32 boot sector")
        );
        crate::ensure!(
            reserved != 0 && num_fats != 0,
            FsParsingError::Invalid("empty reserved region or no FAT")
        );

        let meta_sectors = reserved as u64 + num_fats as u64 * fat_size as u64;
        crate::ensure!(
            (total as u64) > meta_sectors,
            FsParsingError::Invalid("FAT region exceeds volume")
        );
        let cluster_count = ((total as u64 - meta_sectors) / spc as u64) as u32;
        crate::ensure!(
            (cluster_count as u64 + FAT_FIRST_CLUSTER as u64) * FAT_ENTRY_SIZE as u64
                <= fat_size as u64 * bps as u64,
            FsParsingError::Invalid("FAT too small for cluster count")
        );
        crate::ensure!(
            root >= FAT_FIRST_CLUSTER && root < FAT_FIRST_CLUSTER + cluster_count,
            FsParsingError::Invalid("root cluster out of range")
        );

        let fat_offset_bytes = reserved as u64 * bps as u64;
        Ok(Self {
            volume_id: vbr.volume_id,
            volume_label: vbr.volume_label,
            bytes_per_sector: bps,
            sectors_per_cluster: spc,
            bytes_per_cluster: bps as u32 * spc as u32,
            volume_size_bytes: total as u64 * bps as u64,
            volume_size_sectors: total,
            hidden_sectors: vbr.hidden_sectors,
            reserved_sectors: reserved,
            num_fats,
            fat_offset_bytes,
            fat_size_sectors: fat_size,
            cluster_heap_offset: meta_sectors * bps as u64,
            cluster_count,
            root_cluster: root,
        })
    }

    #[inline]
    pub fn fat_size_bytes(&self) -> u64 {
        self.fat_size_sectors as u64 * self.bytes_per_sector as u64
    }

    #[inline]
    pub fn sector_offset(&self, sector: u64) -> u64 {
        sector * self.bytes_per_sector as u64
    }

    /// Label with trailing padding removed.
    pub fn label_str(&self) -> String {
        String::from_utf8_lossy(&self.volume_label)
            .trim_end()
            .to_string()
    }
}

impl FsMeta<u32> for Fat32Meta {
    fn unit_size(&self) -> usize {
        self.bytes_per_cluster as usize
    }

    fn root_unit(&self) -> u32 {
        self.root_cluster
    }

    fn total_units(&self) -> usize {
        self.cluster_count as usize
    }

    fn size_bytes(&self) -> u64 {
        self.volume_size_bytes
    }

    fn unit_offset(&self, cluster: u32) -> u64 {
        self.cluster_heap_offset
            + (cluster.saturating_sub(FAT_FIRST_CLUSTER) as u64 * self.unit_size() as u64)
    }

    fn first_data_unit(&self) -> u32 {
        FAT_FIRST_CLUSTER
    }

    fn last_data_unit(&self) -> u32 {
        FAT_FIRST_CLUSTER + self.cluster_count - 1
    }
}

impl ClusterMeta for Fat32Meta {
    const EOC: u32 = FAT_EOC;
    const FIRST_CLUSTER: u32 = FAT_FIRST_CLUSTER;
    const ENTRY_SIZE: usize = FAT_ENTRY_SIZE;
    const ENTRY_MASK: u32 = FAT_MASK;

    fn fat_entry_offset(&self, cluster: u32, fat_index: u8) -> u64 {
        self.fat_offset_bytes
            + fat_index as u64 * self.fat_size_bytes()
            + cluster as u64 * FAT_ENTRY_SIZE as u64
    }

    fn num_fats(&self) -> u8 {
        self.num_fats
    }
}

/// Cluster size for a volume of `volume_bytes`.
pub fn cluster_size_for(volume_bytes: u64) -> u32 {
    FAT_CLUSTER_SIZE_TABLE
        .iter()
        .find(|(max, _)| volume_bytes <= *max)
        .map(|&(_, cs)| cs)
        .unwrap_or(FAT_MAX_CLUSTER_SIZE)
}

#[inline]
fn is_forbidden_label_byte(b: u8) -> bool {
    b < 0x20 || b == 0x7F || b"\"*+,./:;<=>?[\\]|".contains(&b)
}

/// Encodes `label` as the 11-byte, space-padded, upper-case field stored in
/// the boot sector and the root directory.
pub fn encode_volume_label(label: &str) -> FsFormatterResult<[u8; 11]> {
    if label.is_empty() {
        return Ok(*FAT_VOLUME_LABEL_EMPTY);
    }
    crate::ensure!(
        label.chars().count() <= FAT_VOLUME_LABEL_LEN,
        FsFormatterError::InvalidLabel("longer than 11 characters")
    );
    crate::ensure!(
        label.is_ascii(),
        FsFormatterError::InvalidLabel("non-ASCII character")
    );
    crate::ensure!(
        !label.bytes().any(is_forbidden_label_byte),
        FsFormatterError::InvalidLabel("character not allowed in a FAT label")
    );
    crate::ensure!(
        !label.starts_with(' '),
        FsFormatterError::InvalidLabel("leading space")
    );

    let mut out = [b' '; 11];
    for (slot, b) in out.iter_mut().zip(label.bytes()) {
        *slot = b.to_ascii_uppercase();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn minimum_volume_is_fat32() {
        let meta = Fat32Meta::new(33 * MIB, Some("AMT-SETUP")).unwrap();
        assert_eq!(meta.bytes_per_cluster, 512);
        assert_eq!(meta.sectors_per_cluster, 1);
        assert!(meta.cluster_count >= FAT32_MIN_CLUSTERS);
        assert_eq!(&meta.volume_label, b"AMT-SETUP  ");
        assert_eq!(meta.label_str(), "AMT-SETUP");
        assert_eq!(meta.fat_offset_bytes, 32 * 512);
        assert_eq!(
            meta.cluster_heap_offset,
            meta.fat_offset_bytes + 2 * meta.fat_size_bytes()
        );
        assert!(meta.unit_offset(meta.last_data_unit()) + 512 <= meta.size_bytes());
    }

    #[test]
    fn cluster_size_table() {
        assert_eq!(cluster_size_for(33 * MIB), 512);
        assert_eq!(cluster_size_for(260 * MIB), 512);
        assert_eq!(cluster_size_for(261 * MIB), 4096);
        assert_eq!(cluster_size_for(10 * 1024 * MIB), 8192);
        assert_eq!(cluster_size_for(20 * 1024 * MIB), 16384);
        assert_eq!(cluster_size_for(64 * 1024 * MIB), 32768);
    }

    #[test]
    fn too_small_volume() {
        assert!(matches!(
            Fat32Meta::new(8 * MIB, None),
            Err(FsFormatterError::TooSmall { min: FAT32_MIN_CLUSTERS, .. })
        ));
    }

    #[test]
    fn label_rules() {
        assert_eq!(encode_volume_label("amt-setup").unwrap(), *b"AMT-SETUP  ");
        assert_eq!(encode_volume_label("").unwrap(), *FAT_VOLUME_LABEL_EMPTY);
        assert_eq!(encode_volume_label("ABCDEFGHIJK").unwrap(), *b"ABCDEFGHIJK");
        for bad in ["ABCDEFGHIJKL", "A.B", "A*", "ÉTÉ", " LEAD", "TAB\t"] {
            assert!(
                matches!(encode_volume_label(bad), Err(FsFormatterError::InvalidLabel(_))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn long_label_rejected_before_geometry() {
        // label error wins even though the volume is also too small
        assert!(matches!(
            Fat32Meta::new(MIB, Some("THIS-IS-TOO-LONG")),
            Err(FsFormatterError::InvalidLabel(_))
        ));
    }

    #[test]
    fn params_are_carried() {
        let p = Fat32Params::default()
            .with_label("X")
            .with_volume_id(0xDEAD_BEEF)
            .with_hidden_sectors(2048)
            .with_cluster_size(1024);
        let meta = Fat32Meta::from_params(100 * MIB, &p).unwrap();
        assert_eq!(meta.volume_id, 0xDEAD_BEEF);
        assert_eq!(meta.hidden_sectors, 2048);
        assert_eq!(meta.sectors_per_cluster, 2);
    }

    #[test]
    fn bad_cluster_size_rejected() {
        let p = Fat32Params::default().with_cluster_size(768);
        assert!(matches!(
            Fat32Meta::from_params(100 * MIB, &p),
            Err(FsFormatterError::Invalid(_))
        ));
    }

    #[test]
    fn vbr_round_trip() {
        let p = Fat32Params::default()
            .with_label("AMT-SETUP")
            .with_volume_id(7)
            .with_hidden_sectors(2048);
        let meta = Fat32Meta::from_params(33 * MIB, &p).unwrap();
        let back = Fat32Meta::from_vbr(&Fat32Vbr::from_meta(&meta)).unwrap();
        assert_eq!(back, meta);
    }
}
