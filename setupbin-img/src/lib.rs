// SPDX-License-Identifier: MIT

//! Builds a raw MBR disk image with one FAT32 partition holding an Intel AMT
//! `Setup.bin`, ready to be written to a USB key.

pub mod build;
pub mod constants;
pub mod errors;
pub mod image;
pub mod utils;

pub use build::{BuildOptions, BuildReport, build, format_filesystem};
pub use errors::{ErrorClass, VerificationFailed};
pub use image::{DiskImage, create_image};
