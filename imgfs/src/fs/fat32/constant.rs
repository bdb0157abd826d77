// SPDX-License-Identifier: MIT

// === Disk Layout Parameters ===

pub const FAT_MAX_SECTOR_SIZE: usize = 4096;
pub const FAT_SECTOR_SIZE: u16 = 512; // BPB_BytsPerSec
pub const DEFAULT_FAT_RESERVED_SECTORS: u16 = 32; // BPB_RsvdSecCnt
pub const FAT_NUM_FATS: u8 = 2; // BPB_NumFATs
pub const FAT_HEADS: u16 = 255; // BPB_NumHeads (CHS hint)
pub const FAT_SECTORS_PER_TRACK: u16 = 63; // BPB_SecPerTrk (CHS hint)

/// Cluster size by volume size: `(max volume bytes, cluster bytes)`.
pub const FAT_CLUSTER_SIZE_TABLE: &[(u64, u32)] = &[
    (260 * 1024 * 1024, 512),
    (8 * 1024 * 1024 * 1024, 4096),
    (16 * 1024 * 1024 * 1024, 8192),
    (32 * 1024 * 1024 * 1024, 16384),
];
pub const FAT_MAX_CLUSTER_SIZE: u32 = 32768;

/// Fewer clusters than this and every reader treats the volume as FAT16.
pub const FAT32_MIN_CLUSTERS: u32 = 65_525;
/// Cluster numbers above this collide with the reserved/EOC values.
pub const FAT32_MAX_CLUSTERS: u32 = 0x0FFF_FFF5;

// === FAT Region Parameters ===

pub const FAT_ENTRY_SIZE: usize = 4;
pub const FAT_MASK: u32 = 0x0FFF_FFFF;
pub const FAT_MEDIA_DESCRIPTOR: u8 = 0xF8; // BPB_Media
pub const FAT_ENTRY0: u32 = 0x0FFF_FF00 | FAT_MEDIA_DESCRIPTOR as u32;
pub const FAT_ENTRY1: u32 = 0x0FFF_FFFF;
pub const FAT_EOC: u32 = 0x0FFF_FFFF;
pub const FAT_FREE: u32 = 0;
pub const FAT_FIRST_CLUSTER: u32 = 2;
pub const FAT_ROOT_CLUSTER: u32 = 2; // BPB_RootClus

// === Special Sector Numbers ===

pub const FAT_VBR_SECTOR: u64 = 0;
pub const FAT_VBR_BACKUP_SECTOR: u64 = 6;
pub const FAT_FSINFO_SECTOR: u64 = 1;
pub const FAT_FSINFO_BACKUP_SECTOR: u64 = 7;

// === Standard FAT32 BPB / Extended BPB Constants ===

pub const FAT_JUMP_BOOT: [u8; 3] = [0xEB, 0x58, 0x90]; // BS_jmpBoot
pub const FAT_OEM_NAME: &[u8; 8] = b"MSWIN4.1"; // BS_OEMName
pub const FAT_ROOT_ENTRY_COUNT: u16 = 0; // BPB_RootEntCnt (always 0 for FAT32)
pub const FAT_TOTAL_SECTORS_16: u16 = 0; // BPB_TotSec16 (always 0 for FAT32)
pub const FAT_FAT_SIZE_16: u16 = 0; // BPB_FATSz16 (always 0 for FAT32)
pub const FAT_EXT_FLAGS: u16 = 0; // BPB_ExtFlags (all FATs mirrored)
pub const FAT_FS_VERSION: u16 = 0; // BPB_FSVer
pub const FAT_DRIVE_NUMBER: u8 = 0x80; // BS_DrvNum
pub const FAT_BOOT_SIGNATURE: u8 = 0x29; // BS_BootSig
pub const FAT_FS_TYPE: &[u8; 8] = b"FAT32   "; // BS_FilSysType
pub const FAT_SIGNATURE: u16 = 0xAA55; // 55 AA on disk
pub const FAT_VOLUME_LABEL_EMPTY: &[u8; 11] = b"NO NAME    ";
pub const FAT_VOLUME_LABEL_LEN: usize = 11;
pub const FAT_BOOT_CODE_SIZE: usize = 420;

// === FSINFO Constants ===

pub const FAT_FSINFO_LEAD_SIGNATURE: u32 = 0x4161_5252; // "RRaA"
pub const FAT_FSINFO_STRUCT_SIGNATURE: u32 = 0x6141_7272; // "rrAa"
pub const FAT_FSINFO_TRAIL_SIGNATURE: u32 = 0xAA55_0000;
pub const FAT_FSINFO_UNKNOWN: u32 = 0xFFFF_FFFF;

// === Directory Entries ===

pub const FAT_DIR_ENTRY_SIZE: usize = 32;
pub const FAT_EOD: u8 = 0x00;
pub const FAT_ENTRY_DELETED: u8 = 0xE5;
/// Stored in place of a leading 0xE5 byte of a short name.
pub const FAT_KANJI_E5: u8 = 0x05;
pub const FAT_DOT_NAME: &[u8; 11] = b".          ";
pub const FAT_DOTDOT_NAME: &[u8; 11] = b"..         ";

pub const FAT_LFN_LAST: u8 = 0x40;
pub const FAT_LFN_ORDER_MASK: u8 = 0x3F;
pub const FAT_LFN_CHARS_PER_ENTRY: usize = 13;
pub const FAT_MAX_LFN_CHARS: usize = 255;

/// NT "reserved" byte: base name stored lower-case.
pub const FAT_NT_LOWER_BASE: u8 = 0x08;
/// NT "reserved" byte: extension stored lower-case.
pub const FAT_NT_LOWER_EXT: u8 = 0x10;

/// Highest `~N` numeric tail tried before giving up.
pub const FAT_MAX_NUMERIC_TAIL: u32 = 999_999;
