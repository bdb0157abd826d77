// SPDX-License-Identifier: MIT

pub mod allocator;
pub mod attr;
pub mod checker;
pub mod constant;
pub mod dir;
pub mod filesystem;
pub mod formatter;
pub mod injector;
pub mod meta;
pub mod resolver;
pub mod types;
pub mod utils;

// === Public Interface ===
pub mod traits {
    pub use super::allocator::{Fat32Allocator, Fat32Handle};
    pub use super::checker::{Fat32CheckOptions, Fat32Checker};
    pub use super::formatter::Fat32Formatter;
    pub use super::injector::Fat32Injector;
    pub use super::meta::{Fat32Meta, Fat32Params};
    pub use super::resolver::Fat32Resolver;
}

pub mod prelude {
    pub use super::filesystem::Fat32Volume;
    pub use super::traits::*;
    pub use crate::core::checker::{Finding, Severity, VerifyPhases, VerifyReport};
    pub use crate::core::errors::*;
    pub use crate::core::traits::*;
    pub use imgio::prelude::*;
}
