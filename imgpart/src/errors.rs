// SPDX-License-Identifier: MIT

use core::fmt;

use imgio::errors::*;

/// MBR-specific structural errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MbrError {
    InvalidSignature { expected: [u8; 2], found: [u8; 2] },
    InvalidBootFlag { got: u8 },
    ZeroSectors,
    UnsupportedType { ty: u8 },
    ProtectiveEntry,
    Overlap {
        a_start: u64,
        a_end: u64,
        b_start: u64,
        b_end: u64,
    },
}

impl MbrError {
    pub fn msg(&self) -> &'static str {
        match self {
            MbrError::InvalidSignature { .. } => "MBR: invalid boot signature",
            MbrError::InvalidBootFlag { .. } => "MBR: invalid boot flag",
            MbrError::ZeroSectors => "MBR: partition with zero sectors",
            MbrError::UnsupportedType { .. } => "MBR: unsupported partition type",
            MbrError::ProtectiveEntry => "MBR: protective GPT entry in legacy table",
            MbrError::Overlap { .. } => "MBR: overlapping partitions",
        }
    }
}

impl fmt::Display for MbrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MbrError::InvalidSignature { expected, found } => write!(
                f,
                "{} (expected {:02X?}, found {:02X?})",
                self.msg(),
                expected,
                found
            ),
            MbrError::InvalidBootFlag { got } => write!(f, "{} ({got:#04x})", self.msg()),
            MbrError::UnsupportedType { ty } => write!(f, "{} ({ty:#04x})", self.msg()),
            MbrError::Overlap {
                a_start,
                a_end,
                b_start,
                b_end,
            } => write!(
                f,
                "{} ([{a_start}..={a_end}] and [{b_start}..={b_end}])",
                self.msg()
            ),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

impl std::error::Error for MbrError {}

/// Unified error type for partition planning and MBR handling.
#[derive(Debug)]
pub enum PartError {
    IO(ImgIOError),
    Mbr(MbrError),
    /// The image cannot hold the requested table or partition.
    TooSmall { needed: u64, available: u64 },
    /// An LBA value does not fit the 32-bit MBR fields.
    LbaOverflow { value: u64 },
    /// 1-based partition index out of range or pointing at an empty slot.
    NoSuchPartition { index: usize },
    Invalid(&'static str),
}

impl PartError {
    pub fn msg(&self) -> &'static str {
        match self {
            PartError::IO(_) => "Partition table I/O failed",
            PartError::Mbr(_) => "Invalid MBR",
            PartError::TooSmall { .. } => "Image too small for partition layout",
            PartError::LbaOverflow { .. } => "LBA does not fit in 32-bit MBR field",
            PartError::NoSuchPartition { .. } => "No such partition",
            PartError::Invalid(msg) => msg,
        }
    }
}

impl From<ImgIOError> for PartError {
    fn from(e: ImgIOError) -> Self {
        PartError::IO(e)
    }
}

impl From<MbrError> for PartError {
    fn from(e: MbrError) -> Self {
        PartError::Mbr(e)
    }
}

impl fmt::Display for PartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartError::TooSmall { needed, available } => write!(
                f,
                "{} (needs {needed} bytes, has {available})",
                self.msg()
            ),
            PartError::LbaOverflow { value } => write!(f, "{} ({value})", self.msg()),
            PartError::NoSuchPartition { index } => write!(f, "{} (#{index})", self.msg()),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

impl std::error::Error for PartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PartError::IO(e) => Some(e),
            PartError::Mbr(e) => Some(e),
            _ => None,
        }
    }
}

pub type PartResult<T = ()> = Result<T, PartError>;
