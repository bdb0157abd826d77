// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsAllocatorError, FsAllocatorResult};

/// Trait implemented by all FS allocation handles (cluster chains here).
pub trait FsHandle {}

/// Hands out and takes back allocation units.
pub trait FsAllocator<Handle: FsHandle + Sized + Clone> {
    /// Allocate `count` units as one handle.
    fn allocate_chain(&mut self, count: usize) -> FsAllocatorResult<Handle>;

    fn allocate_unit(&mut self) -> FsAllocatorResult<Handle> {
        self.allocate_chain(1)
    }

    /// Returns the units of `handle` to the free pool.
    fn release(&mut self, handle: &Handle) -> FsAllocatorResult;

    /// Number of units currently used.
    fn used_units(&self) -> usize;

    /// Number of units still free.
    fn remaining_units(&self) -> usize;
}
