// SPDX-License-Identifier: MIT

//! Legacy MBR partition type bytes.

define_mbr_types! {
    FAT12 => "FAT12", 0x01,
    FAT16_SMALL => "FAT16 (<32 MiB)", 0x04,
    EXTENDED => "Extended (CHS)", 0x05,
    FAT16 => "FAT16", 0x06,
    NTFS_EXFAT => "NTFS / exFAT", 0x07,
    FAT32_CHS => "FAT32 (CHS)", 0x0B,
    FAT32_LBA => "FAT32 (LBA)", 0x0C,
    FAT16_LBA => "FAT16 (LBA)", 0x0E,
    EXTENDED_LBA => "Extended (LBA)", 0x0F,
    LINUX_SWAP => "Linux swap", 0x82,
    LINUX => "Linux", 0x83,
    LINUX_EXTENDED => "Linux extended", 0x85,
    LINUX_LVM => "Linux LVM", 0x8E,
    PROTECTIVE_GPT => "GPT protective", 0xEE,
    EFI_SYSTEM => "EFI system", 0xEF,
}

impl MbrPartitionKind {
    #[inline]
    pub fn is_fat32(&self) -> bool {
        matches!(self, Self::FAT32_CHS | Self::FAT32_LBA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        assert_eq!(MbrPartitionKind::from_byte(0x0B), MbrPartitionKind::FAT32_CHS);
        assert_eq!(MbrPartitionKind::FAT32_CHS.as_byte(), MBR_TYPE_FAT32_CHS);
        assert_eq!(MbrPartitionKind::from_byte(0x42), MbrPartitionKind::Unknown(0x42));
        assert!(!MbrPartitionKind::Unknown(0x42).is_known());
    }

    #[test]
    fn display_uses_description() {
        assert_eq!(MbrPartitionKind::FAT32_CHS.to_string(), "FAT32 (CHS)");
        assert_eq!(MbrPartitionKind::Unknown(0x42).to_string(), "Unknown (0x42)");
    }

    #[test]
    fn fat32_family() {
        assert!(MbrPartitionKind::FAT32_LBA.is_fat32());
        assert!(!MbrPartitionKind::FAT16.is_fat32());
    }
}
