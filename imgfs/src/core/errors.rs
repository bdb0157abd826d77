// SPDX-License-Identifier: MIT

use core::fmt;

pub use imgio::errors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsAllocatorError {
    OutOfBlocks,
    InvalidCluster(u32),
    Other(&'static str),
}

impl FsAllocatorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsAllocatorError::OutOfBlocks => "Out of blocks",
            FsAllocatorError::InvalidCluster(_) => "Cluster outside the data region",
            FsAllocatorError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsAllocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsAllocatorError::InvalidCluster(c) => write!(f, "{} (cluster: {c})", self.msg()),
            _ => f.write_str(self.msg()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsParsingError {
    Unsupported,
    Corrupted,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsParsingError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsParsingError::Unsupported => "Unsupported entry",
            FsParsingError::Corrupted => "Corrupted entry",
            FsParsingError::Invalid(msg) => msg,
            FsParsingError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg())
    }
}

#[derive(Debug)]
pub enum FsCursorError {
    IO(ImgIOError),
    InvalidCluster(u32),
    LoopDetected,
    Other(&'static str),
}

impl FsCursorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCursorError::IO(_) => "IO error while walking a cluster chain",
            FsCursorError::InvalidCluster(_) => "Invalid cluster in FAT chain",
            FsCursorError::LoopDetected => "Loop detected in FAT chain",
            FsCursorError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsCursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsCursorError::InvalidCluster(c) => write!(f, "{} (cluster: {c})", self.msg()),
            _ => f.write_str(self.msg()),
        }
    }
}

#[derive(Debug)]
pub enum FsResolverError {
    IO(ImgIOError),
    Cursor(FsCursorError),
    Parsing(FsParsingError),
    NotFound,
    NotADirectory,
    NotAFile,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsResolverError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsResolverError::IO(_) => "IO error",
            FsResolverError::Cursor(_) => "Cursor error",
            FsResolverError::Parsing(_) => "Parsing error",
            FsResolverError::NotFound => "Path not found",
            FsResolverError::NotADirectory => "Not a directory",
            FsResolverError::NotAFile => "Not a file",
            FsResolverError::Invalid(msg) => msg,
            FsResolverError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg())
    }
}

#[derive(Debug)]
pub enum FsFormatterError {
    IO(ImgIOError),
    /// Volume label rejected; nothing has been written yet.
    InvalidLabel(&'static str),
    /// Too few data clusters for FAT32.
    TooSmall { clusters: u32, min: u32 },
    Invalid(&'static str),
    Other(&'static str),
}

impl FsFormatterError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsFormatterError::IO(_) => "IO error",
            FsFormatterError::InvalidLabel(msg) => msg,
            FsFormatterError::TooSmall { .. } => "Volume too small for FAT32",
            FsFormatterError::Invalid(msg) => msg,
            FsFormatterError::Other(msg) => msg,
        }
    }

    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, FsFormatterError::InvalidLabel(_))
    }
}

impl fmt::Display for FsFormatterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsFormatterError::InvalidLabel(msg) => write!(f, "Invalid volume label: {msg}"),
            FsFormatterError::TooSmall { clusters, min } => {
                write!(f, "{} ({clusters} clusters, need {min})", self.msg())
            }
            _ => f.write_str(self.msg()),
        }
    }
}

#[derive(Debug)]
pub enum FsInjectorError {
    IO(ImgIOError),
    Allocator(FsAllocatorError),
    Cursor(FsCursorError),
    Parsing(FsParsingError),
    Resolver(FsResolverError),
    /// File name rejected; nothing has been written yet.
    InvalidName(&'static str),
    FileTooLarge { len: u64 },
    Invalid(&'static str),
    Other(&'static str),
}

impl FsInjectorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsInjectorError::IO(_) => "IO error",
            FsInjectorError::Allocator(_) => "Allocator error",
            FsInjectorError::Cursor(_) => "Cursor error",
            FsInjectorError::Parsing(_) => "Parsing error",
            FsInjectorError::Resolver(_) => "Cannot resolve target directory",
            FsInjectorError::InvalidName(msg) => msg,
            FsInjectorError::FileTooLarge { .. } => "File too large for FAT32",
            FsInjectorError::Invalid(msg) => msg,
            FsInjectorError::Other(msg) => msg,
        }
    }

    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, FsInjectorError::InvalidName(_))
    }
}

impl fmt::Display for FsInjectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsInjectorError::InvalidName(msg) => write!(f, "Invalid file name: {msg}"),
            FsInjectorError::FileTooLarge { len } => write!(f, "{} ({len} bytes)", self.msg()),
            _ => f.write_str(self.msg()),
        }
    }
}

#[derive(Debug)]
pub enum FsCheckerError {
    IO(ImgIOError),
    Parsing(FsParsingError),
    Cursor(FsCursorError),
    Resolver(FsResolverError),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsCheckerError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCheckerError::IO(_) => "IO error",
            FsCheckerError::Parsing(_) => "Parsing error",
            FsCheckerError::Cursor(_) => "Cursor error",
            FsCheckerError::Resolver(_) => "Resolver error",
            FsCheckerError::Invalid(msg) => msg,
            FsCheckerError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsCheckerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg())
    }
}

/// Top-level error
#[derive(Debug)]
pub enum FsError {
    IO(ImgIOError),
    Allocator(FsAllocatorError),
    Parsing(FsParsingError),
    Cursor(FsCursorError),
    Resolver(FsResolverError),
    Formatter(FsFormatterError),
    Injector(FsInjectorError),
    Checker(FsCheckerError),
    Other(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(_) => "Filesystem I/O failed",
            FsError::Allocator(_) => "Cluster allocation failed",
            FsError::Parsing(_) => "Malformed on-disk structure",
            FsError::Cursor(_) => "Broken cluster chain",
            FsError::Resolver(_) => "Lookup failed",
            FsError::Formatter(_) => "Format failed",
            FsError::Injector(_) => "File write failed",
            FsError::Checker(_) => "Check failed",
            FsError::Other(msg) => msg,
        }
    }

    /// `true` when the caller handed in a bad label or file name.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            FsError::Formatter(e) => e.is_invalid_argument(),
            FsError::Injector(e) => e.is_invalid_argument(),
            _ => false,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg())
    }
}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsAllocatorResult<T = ()> = Result<T, FsAllocatorError>;
pub type FsParsingResult<T = ()> = Result<T, FsParsingError>;
pub type FsCursorResult<T = ()> = Result<T, FsCursorError>;
pub type FsResolverResult<T = ()> = Result<T, FsResolverError>;
pub type FsFormatterResult<T = ()> = Result<T, FsFormatterError>;
pub type FsInjectorResult<T = ()> = Result<T, FsInjectorError>;
pub type FsCheckerResult<T = ()> = Result<T, FsCheckerError>;

crate::__impl_fs_error!(FsAllocatorError {});
crate::__impl_fs_error!(FsParsingError {});
crate::__impl_fs_error!(FsCursorError { IO });
crate::__impl_fs_error!(FsResolverError { IO, Cursor, Parsing });
crate::__impl_fs_error!(FsFormatterError { IO });
crate::__impl_fs_error!(FsInjectorError { IO, Allocator, Cursor, Parsing, Resolver });
crate::__impl_fs_error!(FsCheckerError { IO, Parsing, Cursor, Resolver });
crate::__impl_fs_error!(FsError {
    IO, Allocator, Parsing, Cursor, Resolver, Formatter, Injector, Checker
});

crate::fs_error_wiring! {
    top => FsError {
        ImgIOError       : IO,
        FsAllocatorError : Allocator,
        FsParsingError   : Parsing,
        FsCursorError    : Cursor,
        FsResolverError  : Resolver,
        FsFormatterError : Formatter,
        FsInjectorError  : Injector,
        FsCheckerError   : Checker,
    },
    str_into => [
        FsAllocatorError,
        FsParsingError,
        FsCursorError,
        FsResolverError,
        FsFormatterError,
        FsInjectorError,
        FsCheckerError,
    ],
    sub => {
        ImgIOError       => [ FsCursorError::IO, FsResolverError::IO, FsFormatterError::IO, FsInjectorError::IO, FsCheckerError::IO ],
        FsAllocatorError => [ FsInjectorError::Allocator ],
        FsParsingError   => [ FsResolverError::Parsing, FsInjectorError::Parsing, FsCheckerError::Parsing ],
        FsCursorError    => [ FsResolverError::Cursor, FsInjectorError::Cursor, FsCheckerError::Cursor ],
        FsResolverError  => [ FsInjectorError::Resolver, FsCheckerError::Resolver ],
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn chain_is_exposed_through_source() {
        let low = ImgIOError::Unsupported;
        let inj: FsInjectorError = low.into();
        let top: FsError = inj.into();

        assert_eq!(top.to_string(), "File write failed");
        let mid = top.source().unwrap();
        assert_eq!(mid.to_string(), "IO error");
        let leaf = mid.source().unwrap();
        assert_eq!(leaf.to_string(), "Unsupported operation");
        assert!(leaf.source().is_none());
    }

    #[test]
    fn invalid_argument_classification() {
        let label: FsError = FsFormatterError::InvalidLabel("label too long").into();
        assert!(label.is_invalid_argument());
        assert_eq!(
            FsFormatterError::InvalidLabel("label too long").to_string(),
            "Invalid volume label: label too long"
        );

        let full: FsError = FsInjectorError::Allocator(FsAllocatorError::OutOfBlocks).into();
        assert!(!full.is_invalid_argument());
    }

    #[test]
    fn str_converts_into_other() {
        let e: FsResolverError = "boom".into();
        assert!(matches!(e, FsResolverError::Other("boom")));
        let top: FsError = "boom".into();
        assert_eq!(top.to_string(), "boom");
    }
}
