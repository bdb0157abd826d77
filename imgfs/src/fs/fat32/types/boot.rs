// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::fat32::{constant::*, meta::*};

/// FAT32 boot sector (BPB + extended BPB), 512 bytes.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat32Vbr {
    pub jump_boot: [u8; 3],
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entry_count: u16,
    pub total_sectors_16: u16,
    pub media: u8,
    pub fat_size_16: u16,
    pub sectors_per_track: u16,
    pub num_heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors_32: u32,

    // FAT32 Extended BPB
    pub fat_size_32: u32,
    pub ext_flags: u16,
    pub fs_version: u16,
    pub root_cluster: u32,
    pub fsinfo_sector: u16,
    pub backup_boot_sector: u16,
    pub reserved: [u8; 12],

    pub drive_number: u8,
    pub reserved1: u8,
    pub boot_signature: u8,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
    pub fs_type: [u8; 8],

    pub boot_code: [u8; FAT_BOOT_CODE_SIZE],
    pub signature: u16,
}

impl Fat32Vbr {
    pub fn from_meta(meta: &Fat32Meta) -> Self {
        Self {
            jump_boot: FAT_JUMP_BOOT,
            oem_name: *FAT_OEM_NAME,
            bytes_per_sector: meta.bytes_per_sector,
            sectors_per_cluster: meta.sectors_per_cluster,
            reserved_sectors: meta.reserved_sectors,
            num_fats: meta.num_fats,
            root_entry_count: FAT_ROOT_ENTRY_COUNT,
            total_sectors_16: FAT_TOTAL_SECTORS_16,
            media: FAT_MEDIA_DESCRIPTOR,
            fat_size_16: FAT_FAT_SIZE_16,
            sectors_per_track: FAT_SECTORS_PER_TRACK,
            num_heads: FAT_HEADS,
            hidden_sectors: meta.hidden_sectors,
            total_sectors_32: meta.volume_size_sectors,
            fat_size_32: meta.fat_size_sectors,
            ext_flags: FAT_EXT_FLAGS,
            fs_version: FAT_FS_VERSION,
            root_cluster: meta.root_unit(),
            fsinfo_sector: FAT_FSINFO_SECTOR as u16,
            backup_boot_sector: FAT_VBR_BACKUP_SECTOR as u16,
            reserved: [0u8; 12],
            drive_number: FAT_DRIVE_NUMBER,
            reserved1: 0,
            boot_signature: FAT_BOOT_SIGNATURE,
            volume_id: meta.volume_id,
            volume_label: meta.volume_label,
            fs_type: *FAT_FS_TYPE,
            boot_code: [0u8; FAT_BOOT_CODE_SIZE],
            signature: FAT_SIGNATURE,
        }
    }

    /// Compares the on-disk fields with the geometry they should encode.
    pub fn validate(&self, meta: &Fat32Meta) -> Result<(), &'static str> {
        let Self {
            jump_boot,
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            num_fats,
            media,
            total_sectors_32,
            fat_size_32,
            root_cluster,
            fsinfo_sector,
            backup_boot_sector,
            boot_signature,
            fs_type,
            signature,
            ..
        } = *self;

        if signature != FAT_SIGNATURE {
            return Err("boot sector signature is not 55 AA");
        }
        if jump_boot[0] != 0xEB && jump_boot[0] != 0xE9 {
            return Err("jump instruction missing");
        }
        if bytes_per_sector != meta.bytes_per_sector
            || sectors_per_cluster != meta.sectors_per_cluster
        {
            return Err("sector or cluster size mismatch");
        }
        if reserved_sectors != meta.reserved_sectors || num_fats != meta.num_fats {
            return Err("reserved sectors or FAT count mismatch");
        }
        if total_sectors_32 != meta.volume_size_sectors || fat_size_32 != meta.fat_size_sectors {
            return Err("volume or FAT size mismatch");
        }
        if root_cluster != meta.root_unit() {
            return Err("root cluster mismatch");
        }
        if fsinfo_sector as u64 != FAT_FSINFO_SECTOR
            || backup_boot_sector as u64 != FAT_VBR_BACKUP_SECTOR
        {
            return Err("FSInfo or backup boot sector misplaced");
        }
        if media != FAT_MEDIA_DESCRIPTOR {
            return Err("unexpected media descriptor");
        }
        if boot_signature != FAT_BOOT_SIGNATURE || &fs_type != FAT_FS_TYPE {
            return Err("extended boot signature or FS type missing");
        }
        Ok(())
    }
}

/// FAT32 FSInfo sector: free-cluster hints, 512 bytes.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat32FsInfo {
    pub lead_signature: u32,
    pub reserved1: [u8; 480],
    pub struct_signature: u32,
    pub free_cluster_count: u32,
    pub next_free_cluster: u32,
    pub reserved2: [u8; 12],
    pub trail_signature: u32,
}

impl Fat32FsInfo {
    pub fn new(free_cluster_count: u32, next_free_cluster: u32) -> Self {
        Self {
            lead_signature: FAT_FSINFO_LEAD_SIGNATURE,
            reserved1: [0u8; 480],
            struct_signature: FAT_FSINFO_STRUCT_SIGNATURE,
            free_cluster_count,
            next_free_cluster,
            reserved2: [0u8; 12],
            trail_signature: FAT_FSINFO_TRAIL_SIGNATURE,
        }
    }

    /// FSInfo of a freshly formatted volume: only the root cluster is used.
    pub fn from_meta(meta: &Fat32Meta) -> Self {
        Self::new(meta.cluster_count - 1, meta.root_unit() + 1)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        let (lead, mid, trail) = (
            self.lead_signature,
            self.struct_signature,
            self.trail_signature,
        );
        if lead != FAT_FSINFO_LEAD_SIGNATURE
            || mid != FAT_FSINFO_STRUCT_SIGNATURE
            || trail != FAT_FSINFO_TRAIL_SIGNATURE
        {
            return Err("FSInfo signatures missing");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_one_sector() {
        assert_eq!(core::mem::size_of::<Fat32Vbr>(), 512);
        assert_eq!(core::mem::size_of::<Fat32FsInfo>(), 512);
    }

    #[test]
    fn vbr_layout_offsets() {
        let meta = Fat32Meta::new(33 * 1024 * 1024, Some("AMT-SETUP")).unwrap();
        let vbr = Fat32Vbr::from_meta(&meta);
        let raw = vbr.as_bytes();

        assert_eq!(&raw[0..3], &FAT_JUMP_BOOT);
        assert_eq!(u16::from_le_bytes([raw[11], raw[12]]), 512);
        assert_eq!(raw[13], 1);
        assert_eq!(u16::from_le_bytes([raw[14], raw[15]]), 32);
        assert_eq!(raw[16], 2);
        assert_eq!(raw[21], 0xF8);
        assert_eq!(u32::from_le_bytes(raw[44..48].try_into().unwrap()), 2);
        assert_eq!(&raw[71..82], b"AMT-SETUP  ");
        assert_eq!(&raw[82..90], b"FAT32   ");
        assert_eq!(&raw[510..512], &[0x55, 0xAA]);
        assert!(vbr.validate(&meta).is_ok());
    }

    #[test]
    fn vbr_mismatch_is_reported() {
        let meta = Fat32Meta::new(33 * 1024 * 1024, None).unwrap();
        let mut vbr = Fat32Vbr::from_meta(&meta);
        vbr.signature = 0;
        assert!(vbr.validate(&meta).is_err());
    }

    #[test]
    fn fsinfo_layout() {
        let fsi = Fat32FsInfo::new(100, 3);
        let raw = fsi.as_bytes();
        assert_eq!(&raw[0..4], b"RRaA");
        assert_eq!(&raw[484..488], b"rrAa");
        assert_eq!(u32::from_le_bytes(raw[488..492].try_into().unwrap()), 100);
        assert_eq!(u32::from_le_bytes(raw[492..496].try_into().unwrap()), 3);
        assert_eq!(&raw[508..512], &[0x00, 0x00, 0x55, 0xAA]);
        assert!(fsi.validate().is_ok());
    }
}
