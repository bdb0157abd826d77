// SPDX-License-Identifier: MIT

// === Sub-modules ===
pub mod allocator;
pub mod checker;
pub mod errors;
pub mod fat;
pub mod formatter;
pub mod injector;
pub mod meta;
pub mod resolver;
pub mod utils;

#[macro_use]
mod macros;

// === Core Traits ===
pub mod traits {
    pub use super::allocator::{FsAllocator, FsHandle};
    pub use super::checker::FsChecker;
    pub use super::fat::ClusterMeta;
    pub use super::formatter::FsFormatter;
    pub use super::injector::{FsFileInjector, WriteOutcome};
    pub use super::meta::FsMeta;
    pub use super::resolver::{FileAttributes, FsDirEntry, FsResolver};
}

// === Error types ===
pub use errors::*;

// === Utilities ===
pub use utils::{path_utils::*, time_utils::*, volume_utils::*};
