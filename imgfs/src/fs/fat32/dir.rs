// SPDX-License-Identifier: MIT

//! Slot-level view of a directory's cluster chain.

use crate::{
    core::errors::*,
    fs::fat32::{attr::Fat32Attributes, constant::*, meta::*, types::Fat32Entries},
};

/// An entry set found in a directory buffer.
#[derive(Debug, Clone)]
pub struct DirRecord {
    /// Index of the first slot of the set (first LFN slot, or the 8.3 slot).
    pub slot: usize,
    pub entries: Fat32Entries,
}

impl DirRecord {
    /// Index of the 8.3 slot.
    #[inline]
    pub fn sfn_slot(&self) -> usize {
        self.slot + self.entries.lfn.len()
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        let name = self.entries.entry.name;
        &name == FAT_DOT_NAME || &name == FAT_DOTDOT_NAME
    }
}

/// Parses every live entry set up to the end-of-directory marker.
pub fn parse_dir(buf: &[u8]) -> FsParsingResult<Vec<DirRecord>> {
    let mut out = Vec::new();
    let mut lfn_stack: Vec<[u8; 32]> = Vec::new();
    let mut lfn_start = 0;

    for (i, raw) in buf.chunks_exact(FAT_DIR_ENTRY_SIZE).enumerate() {
        match raw[0] {
            FAT_EOD => break,
            FAT_ENTRY_DELETED => {
                lfn_stack.clear();
                continue;
            }
            _ => {}
        }

        if Fat32Attributes::is_lfn(raw[11]) {
            if raw[0] & FAT_LFN_LAST != 0 {
                lfn_stack.clear();
                lfn_start = i;
            }
            if !lfn_stack.is_empty() || raw[0] & FAT_LFN_LAST != 0 {
                let mut slot = [0u8; 32];
                slot.copy_from_slice(raw);
                lfn_stack.push(slot);
            }
            continue;
        }

        let entries = Fat32Entries::from_raw(&lfn_stack, raw)?;
        let slot = if entries.lfn.is_empty() { i } else { lfn_start };
        out.push(DirRecord { slot, entries });
        lfn_stack.clear();
    }
    Ok(out)
}

/// First run of `count` reusable slots.
///
/// Returns the run's first slot and whether it sits past the
/// end-of-directory marker.
pub fn find_free_run(buf: &[u8], count: usize) -> Option<(usize, bool)> {
    let slots = buf.len() / FAT_DIR_ENTRY_SIZE;
    let mut run_start = 0;
    let mut run_len = 0;

    for i in 0..slots {
        let first = buf[i * FAT_DIR_ENTRY_SIZE];
        if first == FAT_EOD {
            // everything from here on is free
            let start = if run_len > 0 { run_start } else { i };
            return (slots - start >= count).then_some((start, true));
        }
        if first == FAT_ENTRY_DELETED {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            if run_len == count {
                return Some((run_start, false));
            }
        } else {
            run_len = 0;
        }
    }
    None
}

/// Volume-relative offsets of `slots` consecutive directory slots starting
/// at `first`, mapped through the directory's cluster chain.
pub fn slot_offsets(meta: &Fat32Meta, chain: &[u32], first: usize, slots: usize) -> Vec<u64> {
    let per_cluster = meta.unit_size() / FAT_DIR_ENTRY_SIZE;
    (first..first + slots)
        .filter_map(|s| {
            let cluster = *chain.get(s / per_cluster)?;
            Some(meta.unit_offset(cluster) + ((s % per_cluster) * FAT_DIR_ENTRY_SIZE) as u64)
        })
        .collect()
}
