// SPDX-License-Identifier: MIT

pub use crate::core::allocator::*;

use imgio::prelude::*;

use crate::fs::fat32::{constant::*, meta::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fat32Handle {
    pub cluster_id: u32,
    pub cluster_chain: Vec<u32>,
}

impl Fat32Handle {
    pub fn new(cluster_id: u32) -> Self {
        Fat32Handle {
            cluster_id,
            cluster_chain: vec![cluster_id],
        }
    }

    /// Handle over an existing chain; an empty chain yields cluster 0.
    pub fn from_chain(cluster_chain: Vec<u32>) -> Self {
        Self {
            cluster_id: cluster_chain.first().copied().unwrap_or(0),
            cluster_chain,
        }
    }

    pub fn len(&self) -> usize {
        self.cluster_chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cluster_chain.is_empty()
    }
}

impl FsHandle for Fat32Handle {}

/// In-memory mirror of the primary FAT used to find free clusters.
///
/// Allocation only updates the mirror; callers persist chains with
/// [`crate::core::fat::chain::write_chain`].
#[derive(Debug, Clone)]
pub struct Fat32Allocator {
    table: Vec<u32>,
    first: u32,
    last: u32,
    free: usize,
    next_free: u32,
}

impl Fat32Allocator {
    /// Allocator for a freshly formatted volume: only the root cluster is used.
    pub fn new(meta: &Fat32Meta) -> Self {
        let mut table = vec![FAT_FREE; meta.cluster_count as usize + FAT_FIRST_CLUSTER as usize];
        table[0] = FAT_ENTRY0;
        table[1] = FAT_ENTRY1;
        table[meta.root_unit() as usize] = FAT_EOC;
        Self::from_table(meta, table)
    }

    /// Loads FAT copy 0 of an existing volume.
    pub fn load<IO: ImgIO + ?Sized>(io: &mut IO, meta: &Fat32Meta) -> ImgIOResult<Self> {
        let entries = meta.cluster_count as usize + FAT_FIRST_CLUSTER as usize;
        let mut table = Vec::with_capacity(entries);
        io.read_chunks_streamed::<FAT_ENTRY_SIZE, _>(
            meta.fat_offset_bytes,
            entries,
            imgio::BLOCK_BUF_SIZE / FAT_ENTRY_SIZE,
            |_, raw| table.push(u32::from_le_bytes(*raw) & FAT_MASK),
        )?;
        Ok(Self::from_table(meta, table))
    }

    fn from_table(meta: &Fat32Meta, table: Vec<u32>) -> Self {
        let first = meta.first_data_unit();
        let last = meta.last_data_unit();
        let free = table[first as usize..=last as usize]
            .iter()
            .filter(|&&e| e == FAT_FREE)
            .count();
        let mut alloc = Self {
            table,
            first,
            last,
            free,
            next_free: first,
        };
        alloc.next_free = alloc.scan_free(first).unwrap_or(first);
        alloc
    }

    /// Entry of `cluster` in the mirror.
    #[inline]
    pub fn entry(&self, cluster: u32) -> Option<u32> {
        self.table.get(cluster as usize).copied()
    }

    /// Hint for the FSInfo "next free" field.
    #[inline]
    pub fn next_free_hint(&self) -> u32 {
        self.next_free
    }

    #[inline]
    pub fn free_clusters(&self) -> u32 {
        self.free as u32
    }

    /// First free cluster at or after `from`, wrapping around once.
    fn scan_free(&self, from: u32) -> Option<u32> {
        let from = from.clamp(self.first, self.last);
        (from..=self.last)
            .chain(self.first..from)
            .find(|&c| self.table[c as usize] == FAT_FREE)
    }
}

impl FsAllocator<Fat32Handle> for Fat32Allocator {
    fn allocate_chain(&mut self, count: usize) -> FsAllocatorResult<Fat32Handle> {
        if count == 0 {
            return Err(FsAllocatorError::Other("zero-length chain requested"));
        }
        if count > self.free {
            return Err(FsAllocatorError::OutOfBlocks);
        }

        let mut chain = Vec::with_capacity(count);
        let mut cursor = self.next_free;
        while chain.len() < count {
            let cluster = self.scan_free(cursor).ok_or(FsAllocatorError::OutOfBlocks)?;
            // reserve now so the next scan moves on
            self.table[cluster as usize] = FAT_EOC;
            chain.push(cluster);
            cursor = if cluster == self.last { self.first } else { cluster + 1 };
        }
        for pair in chain.windows(2) {
            self.table[pair[0] as usize] = pair[1];
        }

        self.free -= count;
        self.next_free = self.scan_free(cursor).unwrap_or(self.first);
        Ok(Fat32Handle::from_chain(chain))
    }

    fn release(&mut self, handle: &Fat32Handle) -> FsAllocatorResult {
        for &c in &handle.cluster_chain {
            if c < self.first || c > self.last {
                return Err(FsAllocatorError::InvalidCluster(c));
            }
        }
        for &c in &handle.cluster_chain {
            if self.table[c as usize] != FAT_FREE {
                self.table[c as usize] = FAT_FREE;
                self.free += 1;
            }
        }
        if let Some(&lowest) = handle.cluster_chain.iter().min() {
            self.next_free = self.next_free.min(lowest);
        }
        Ok(())
    }

    fn used_units(&self) -> usize {
        (self.last - self.first + 1) as usize - self.free
    }

    fn remaining_units(&self) -> usize {
        self.free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fat::chain;

    const MIB: u64 = 1024 * 1024;

    fn meta() -> Fat32Meta {
        Fat32Meta::new(33 * MIB, None).unwrap()
    }

    #[test]
    fn fresh_volume_hands_out_contiguous_clusters() {
        let meta = meta();
        let mut alloc = Fat32Allocator::new(&meta);
        assert_eq!(alloc.used_units(), 1);
        assert_eq!(alloc.next_free_hint(), 3);

        let h = alloc.allocate_chain(4).unwrap();
        assert_eq!(h.cluster_chain, vec![3, 4, 5, 6]);
        assert_eq!(h.cluster_id, 3);
        assert_eq!(alloc.entry(3), Some(4));
        assert_eq!(alloc.entry(6), Some(FAT_EOC));
        assert_eq!(alloc.remaining_units(), meta.cluster_count as usize - 5);
        assert_eq!(alloc.next_free_hint(), 7);
    }

    #[test]
    fn release_makes_clusters_reusable() {
        let meta = meta();
        let mut alloc = Fat32Allocator::new(&meta);
        let a = alloc.allocate_chain(2).unwrap();
        let _b = alloc.allocate_chain(1).unwrap();
        alloc.release(&a).unwrap();
        assert_eq!(alloc.next_free_hint(), 3);

        let c = alloc.allocate_chain(3).unwrap();
        assert_eq!(c.cluster_chain, vec![3, 4, 6]);
    }

    #[test]
    fn out_of_blocks() {
        let meta = meta();
        let mut alloc = Fat32Allocator::new(&meta);
        let free = alloc.remaining_units();
        assert_eq!(
            alloc.allocate_chain(free + 1),
            Err(FsAllocatorError::OutOfBlocks)
        );
        assert_eq!(alloc.remaining_units(), free);
        assert!(alloc.allocate_chain(free).is_ok());
        assert_eq!(alloc.allocate_unit(), Err(FsAllocatorError::OutOfBlocks));
    }

    #[test]
    fn release_rejects_foreign_clusters() {
        let mut alloc = Fat32Allocator::new(&meta());
        assert_eq!(
            alloc.release(&Fat32Handle::new(1)),
            Err(FsAllocatorError::InvalidCluster(1))
        );
    }

    #[test]
    fn load_matches_disk() {
        let meta = meta();
        let mut buf = vec![0u8; meta.size_bytes() as usize];
        let mut io = MemImgIO::new(&mut buf);
        chain::write_chain(&mut io, &meta, &[2]).unwrap();
        chain::write_chain(&mut io, &meta, &[3, 4, 9]).unwrap();

        let alloc = Fat32Allocator::load(&mut io, &meta).unwrap();
        assert_eq!(alloc.entry(4), Some(9));
        assert_eq!(alloc.used_units(), 4);
        assert_eq!(alloc.next_free_hint(), 5);
    }
}
