// SPDX-License-Identifier: MIT

//! Failure classes reported on the final diagnostic line.

use core::fmt;

use imgfs::core::errors::{FsAllocatorError, FsError, FsFormatterError, FsInjectorError};
use imgio::errors::ImgIOError;
use imgpart::errors::PartError;

/// Coarse class of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Host file could not be read, created or written, or the volume
    /// ran out of clusters.
    Io,
    /// Partition table or filesystem could not be built or did not verify.
    Format,
    /// A label or path broke a FAT constraint.
    InvalidArgument,
}

impl ErrorClass {
    /// Classifies `err` by walking its cause chain.
    ///
    /// A rejected argument wins over everything else, then host I/O or a full
    /// volume; any other failure is a format error.
    pub fn of(err: &anyhow::Error) -> Self {
        let mut io = false;
        for cause in err.chain() {
            if is_invalid_argument(cause) {
                return ErrorClass::InvalidArgument;
            }
            io |= is_host_io(cause) || is_volume_full(cause);
        }
        if io { ErrorClass::Io } else { ErrorClass::Format }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorClass::Io => "IOError",
            ErrorClass::Format => "FormatError",
            ErrorClass::InvalidArgument => "InvalidArgument",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_invalid_argument(cause: &(dyn std::error::Error + 'static)) -> bool {
    if let Some(e) = cause.downcast_ref::<FsError>() {
        return e.is_invalid_argument();
    }
    if let Some(e) = cause.downcast_ref::<FsFormatterError>() {
        return e.is_invalid_argument();
    }
    if let Some(e) = cause.downcast_ref::<FsInjectorError>() {
        return e.is_invalid_argument();
    }
    false
}

fn is_host_io(cause: &(dyn std::error::Error + 'static)) -> bool {
    if cause.is::<std::io::Error>() {
        return true;
    }
    if let Some(e) = cause.downcast_ref::<ImgIOError>() {
        return e.is_host_io();
    }
    matches!(cause.downcast_ref::<PartError>(), Some(PartError::IO(e)) if e.is_host_io())
}

fn is_volume_full(cause: &(dyn std::error::Error + 'static)) -> bool {
    matches!(
        cause.downcast_ref::<FsAllocatorError>(),
        Some(FsAllocatorError::OutOfBlocks)
    )
}

/// Post-write verification found structural errors.
#[derive(Debug)]
pub struct VerificationFailed {
    pub errors: usize,
    pub first: String,
}

impl fmt::Display for VerificationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "image verification failed with {} error(s), first: {}",
            self.errors, self.first
        )
    }
}

impl std::error::Error for VerificationFailed {}
