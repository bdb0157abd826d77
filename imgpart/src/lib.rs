// SPDX-License-Identifier: MIT

//! Partition geometry and legacy MBR tables for raw disk images.

#[macro_use]
mod macros;
mod io_ext;

pub mod errors;
/// Partition start/size planning.
pub mod geometry;
/// Known MBR partition type bytes.
pub mod kinds;
/// Master Boot Record encoding and validation.
pub mod mbr;
/// Single-partition table writer and partition lookup.
pub mod table;

pub use geometry::{PartitionPlan, plan};
pub use io_ext::ImgIOLbaExt;
pub use table::{PartitionSpan, locate_partition, partition};

pub const DEFAULT_SECTOR_SIZE: u64 = 512;
