// SPDX-License-Identifier: MIT

/// Prefix of every log line.
pub const APP_NAME: &str = "amt-setupbin-img";

/// FAT volume label of the produced image (at most 11 characters).
pub const VOLUME_LABEL: &str = "AMT-SETUP";

/// Where the payload lands inside the volume.
pub const TARGET_PATH: &str = "/Setup.bin";

pub const DEFAULT_SOURCE_PATH: &str = "Setup.bin";
pub const DEFAULT_IMAGE_PATH: &str = "Setup.bin.img";

pub const SECTOR_SIZE: u64 = imgpart::DEFAULT_SECTOR_SIZE;

/// 1-based MBR slot holding the FAT32 partition.
pub const PARTITION_INDEX: usize = 1;
