// SPDX-License-Identifier: MIT

use crate::core::errors::*;
use crate::core::meta::FsMeta;
use imgio::prelude::*;

/// Geometry of a File Allocation Table.
pub trait ClusterMeta: FsMeta<u32> {
    const EOC: u32;
    const FIRST_CLUSTER: u32;
    const ENTRY_SIZE: usize;
    /// Bits of an entry that carry the cluster number.
    const ENTRY_MASK: u32;

    /// Volume-relative offset of `cluster`'s entry in FAT copy `fat_index`.
    fn fat_entry_offset(&self, cluster: u32, fat_index: u8) -> u64;

    fn num_fats(&self) -> u8;

    /// Value at or above which an entry ends the chain.
    fn is_eoc(&self, value: u32) -> bool {
        value >= (Self::EOC & 0xFFFF_FFF8)
    }

    /// Cluster that may appear inside a chain (root included).
    fn is_chain_cluster(&self, cluster: u32) -> bool {
        cluster >= Self::FIRST_CLUSTER && cluster <= self.last_data_unit()
    }
}

/// FAT chain helpers, generic over the table geometry.
pub mod chain {
    use super::*;

    #[inline]
    pub fn read_entry<IO, M>(io: &mut IO, meta: &M, cluster: u32, fat_index: u8) -> ImgIOResult<u32>
    where
        IO: ImgIO + ?Sized,
        M: ClusterMeta,
    {
        let off = meta.fat_entry_offset(cluster, fat_index);
        let mut buf = [0u8; 4];
        let n = M::ENTRY_SIZE;
        debug_assert!(n <= 4 && n != 0);
        io.read_at(off, &mut buf[..n])?;
        Ok(u32::from_le_bytes(buf) & M::ENTRY_MASK)
    }

    /// Follows the chain starting at `start` in the primary FAT.
    ///
    /// Fails on free, reserved or out-of-range links and on cycles.
    pub fn read_chain<IO: ImgIO + ?Sized, M: ClusterMeta>(
        io: &mut IO,
        meta: &M,
        start: u32,
    ) -> FsCursorResult<Vec<u32>> {
        let limit = meta.total_units() + 1;
        let mut chain = Vec::new();
        let mut current = start;

        loop {
            if !meta.is_chain_cluster(current) {
                return Err(FsCursorError::InvalidCluster(current));
            }
            chain.push(current);
            if chain.len() > limit {
                return Err(FsCursorError::LoopDetected);
            }
            let next = read_entry(io, meta, current, 0)?;
            if meta.is_eoc(next) {
                return Ok(chain);
            }
            current = next;
        }
    }

    /// Raw little-endian entries for `chain`: each links to the next, the
    /// last one holds EOC.
    pub fn build_entries<M: ClusterMeta>(chain: &[u32]) -> Vec<u8> {
        let mut out = vec![0u8; chain.len() * M::ENTRY_SIZE];
        for (i, slot) in out.chunks_exact_mut(M::ENTRY_SIZE).enumerate() {
            let next = chain.get(i + 1).copied().unwrap_or(M::EOC) & M::ENTRY_MASK;
            slot.copy_from_slice(&next.to_le_bytes()[..M::ENTRY_SIZE]);
        }
        out
    }

    pub fn entry_offsets<M: ClusterMeta>(meta: &M, chain: &[u32], fat_index: u8) -> Vec<u64> {
        chain
            .iter()
            .map(|&c| meta.fat_entry_offset(c, fat_index))
            .collect()
    }

    /// Writes `chain` into every FAT copy.
    pub fn write_chain<IO: ImgIO + ?Sized, M: ClusterMeta>(
        io: &mut IO,
        meta: &M,
        chain: &[u32],
    ) -> ImgIOResult {
        if chain.is_empty() {
            return Ok(());
        }
        let entries = build_entries::<M>(chain);
        for fi in 0..meta.num_fats() {
            let offs = entry_offsets(meta, chain, fi);
            io.write_multi_at(&offs, M::ENTRY_SIZE, &entries)?;
        }
        Ok(())
    }

    /// Marks every cluster of `chain` free in every FAT copy.
    pub fn free_chain<IO: ImgIO + ?Sized, M: ClusterMeta>(
        io: &mut IO,
        meta: &M,
        chain: &[u32],
    ) -> ImgIOResult {
        let zeros = vec![0u8; chain.len() * M::ENTRY_SIZE];
        for fi in 0..meta.num_fats() {
            let offs = entry_offsets(meta, chain, fi);
            io.write_multi_at(&offs, M::ENTRY_SIZE, &zeros)?;
        }
        Ok(())
    }

    /// Groups `chain` into `(first_cluster, len)` runs of adjacent clusters.
    pub fn runs(chain: &[u32]) -> Vec<(u32, u32)> {
        let mut out: Vec<(u32, u32)> = Vec::new();
        for &c in chain {
            match out.last_mut() {
                Some((start, len)) if *start + *len == c => *len += 1,
                _ => out.push((c, 1)),
            }
        }
        out
    }

    #[inline]
    pub fn is_contiguous(chain: &[u32]) -> bool {
        runs(chain).len() <= 1
    }
}
