// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for ImgIO operations.
pub type ImgIOResult<T = ()> = core::result::Result<T, ImgIOError>;

/// Error type for ImgIO operations.
#[derive(Debug)]
pub enum ImgIOError {
    /// Host I/O failure (open, seek, read, write, truncate).
    Io(std::io::Error),

    /// Access past the end of the backing store.
    OutOfBounds { offset: u64, len: u64, capacity: u64 },

    /// Caller handed in inconsistent arguments.
    Invalid(&'static str),

    /// Backend cannot perform this operation.
    Unsupported,
}

impl ImgIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            ImgIOError::Io(_) => "I/O error",
            ImgIOError::OutOfBounds { .. } => "Out of bounds",
            ImgIOError::Invalid(msg) => msg,
            ImgIOError::Unsupported => "Unsupported operation",
        }
    }

    /// `true` when the error originates from the host rather than from a
    /// bounds or argument check.
    #[inline]
    pub fn is_host_io(&self) -> bool {
        matches!(self, ImgIOError::Io(_))
    }
}

impl fmt::Display for ImgIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImgIOError::OutOfBounds {
                offset,
                len,
                capacity,
            } => write!(
                f,
                "{} (offset={offset:#x}, len={len}, capacity={capacity})",
                self.msg()
            ),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

impl std::error::Error for ImgIOError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImgIOError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImgIOError {
    #[cold]
    #[inline(never)]
    fn from(e: std::io::Error) -> Self {
        ImgIOError::Io(e)
    }
}
