// SPDX-License-Identifier: MIT

pub use crate::core::utils::volume_utils::*;

/// Static geometry of a filesystem, shared by formatter, allocator,
/// injector, resolver and checker.
pub trait FsMeta<Unit: Ord + Copy> {
    /// Size of one allocation unit in bytes.
    fn unit_size(&self) -> usize;

    /// Byte offset (volume-relative) of an allocation unit.
    fn unit_offset(&self, unit: Unit) -> u64;

    /// Root unit (root cluster).
    fn root_unit(&self) -> Unit;

    /// First unit handed out by the allocator.
    fn first_data_unit(&self) -> Unit;

    /// Last valid unit.
    fn last_data_unit(&self) -> Unit;

    /// Total number of data units.
    fn total_units(&self) -> usize;

    /// Total size in bytes of the FS.
    fn size_bytes(&self) -> u64;

    fn is_valid_unit(&self, unit: Unit) -> bool {
        unit >= self.first_data_unit() && unit <= self.last_data_unit()
    }
}
