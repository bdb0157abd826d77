// SPDX-License-Identifier: MIT

pub mod log;
pub mod progress;
pub mod string;

pub use progress::StageSpinner;
pub use string::{pretty_bytes, sep_u64, shell_quote};
