// SPDX-License-Identifier: MIT

//! FAT32 formatting, file injection, lookup and consistency checks over
//! [`imgio`] backends.

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use self::core::traits::*;

// Utilities
pub use self::core::utils::{path_utils::*, volume_utils::*};

/// FAT32 filesystem implementation.
///
/// See [`fat32::Fat32Volume`], [`fat32::Fat32Formatter`] and [`fat32::Fat32Injector`].
pub mod fat32 {
    pub use super::fs::fat32::prelude::*;
}
