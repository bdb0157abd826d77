// SPDX-License-Identifier: MIT

use imgio::prelude::*;

pub use crate::core::injector::*;

use crate::core::{fat::chain, resolver::FileAttributes, utils::path_utils::split_parent};
use crate::fs::fat32::{
    allocator::*,
    constant::*,
    dir::{find_free_run, slot_offsets},
    meta::*,
    resolver::{DirView, Fat32Resolver},
    types::*,
    utils::{self, ShortName},
};

/// FAT32 directories are capped at 65536 slots.
const FAT_MAX_DIR_SLOTS: usize = 65_536;

pub struct Fat32Injector<'a, IO: ImgIO + ?Sized> {
    io: &'a mut IO,
    allocator: &'a mut Fat32Allocator,
    meta: &'a Fat32Meta,
}

impl<'a, IO: ImgIO + ?Sized> Fat32Injector<'a, IO> {
    pub fn new(io: &'a mut IO, allocator: &'a mut Fat32Allocator, meta: &'a Fat32Meta) -> Self {
        Self {
            io,
            allocator,
            meta,
        }
    }

    /// Writes `content` into `chain` and zeroes the slack of the last cluster.
    fn write_data(&mut self, chain: &[u32], content: &[u8]) -> FsInjectorResult {
        let cs = self.meta.unit_size();
        let mut done = 0usize;
        for (start, run) in chain::runs(chain) {
            let n = (run as usize * cs).min(content.len() - done);
            self.io.write_in_chunks(
                self.meta.unit_offset(start),
                &content[done..done + n],
                imgio::BLOCK_BUF_SIZE,
            )?;
            done += n;
        }

        let slack = chain.len() * cs - content.len();
        if let (Some(&last), true) = (chain.last(), slack > 0) {
            self.io
                .zero_fill(self.meta.unit_offset(last) + (cs - slack) as u64, slack)?;
        }
        Ok(())
    }

    /// Allocates, fills and links a chain for `content`; empty content
    /// gets no cluster.
    fn store_content(&mut self, content: &[u8]) -> FsInjectorResult<Fat32Handle> {
        let need = content.len().div_ceil(self.meta.unit_size());
        if need == 0 {
            return Ok(Fat32Handle::from_chain(Vec::new()));
        }
        let handle = self.allocator.allocate_chain(need)?;
        self.write_data(&handle.cluster_chain, content)?;
        chain::write_chain(self.io, self.meta, &handle.cluster_chain)?;
        Ok(handle)
    }

    /// Frees the chain starting at `first` in memory and on disk.
    fn release_chain(&mut self, first: u32) -> FsInjectorResult<usize> {
        if first == 0 {
            return Ok(0);
        }
        let old = Fat32Handle::from_chain(chain::read_chain(self.io, self.meta, first)?);
        self.allocator.release(&old)?;
        chain::free_chain(self.io, self.meta, &old.cluster_chain)?;
        Ok(old.len())
    }

    /// Short name for `name` that no entry of `view` uses yet.
    fn unique_short_name(&self, name: &str, view: &DirView) -> FsInjectorResult<ShortName> {
        let mut short = utils::to_short_name(name);
        let taken = |raw: &[u8; 11]| view.records.iter().any(|r| &r.entries.entry.name == raw);

        if !short.lossy && !taken(&short.raw) {
            return Ok(short);
        }
        let basis = short.raw;
        for n in 1..=FAT_MAX_NUMERIC_TAIL {
            let cand = utils::with_numeric_tail(&basis, n);
            if !taken(&cand) {
                short.raw = cand;
                short.needs_lfn = true;
                short.nt_case = 0;
                return Ok(short);
            }
        }
        Err(FsInjectorError::Invalid("no free short name left in directory"))
    }

    /// Appends one zeroed cluster to the directory.
    fn grow_dir(&mut self, view: &mut DirView) -> FsInjectorResult {
        let per_cluster = self.meta.unit_size() / FAT_DIR_ENTRY_SIZE;
        crate::ensure!(
            view.buf.len() / FAT_DIR_ENTRY_SIZE + per_cluster <= FAT_MAX_DIR_SLOTS,
            FsInjectorError::Invalid("directory is full")
        );
        let handle = self.allocator.allocate_unit()?;
        let cluster = handle.cluster_id;
        self.io
            .zero_fill(self.meta.unit_offset(cluster), self.meta.unit_size())?;

        let tail = *view.chain.last().ok_or(FsInjectorError::Invalid("empty directory chain"))?;
        chain::write_chain(self.io, self.meta, &[tail, cluster])?;
        view.chain.push(cluster);
        view.buf.resize(view.buf.len() + self.meta.unit_size(), 0);
        Ok(())
    }

    fn add_entry(&mut self, view: &mut DirView, entries: &Fat32Entries) -> FsInjectorResult {
        let slots = entries.slot_count();
        let (slot, past_eod) = loop {
            if let Some(found) = find_free_run(&view.buf, slots) {
                break found;
            }
            self.grow_dir(view)?;
        };

        let mut raw = Vec::with_capacity(slots * FAT_DIR_ENTRY_SIZE);
        entries.to_raw_buffer(&mut raw);
        let offs = slot_offsets(self.meta, &view.chain, slot, slots);
        self.io.write_multi_at(&offs, FAT_DIR_ENTRY_SIZE, &raw)?;

        // keep the end marker right after the new set
        let next = slot + slots;
        if past_eod
            && next < view.buf.len() / FAT_DIR_ENTRY_SIZE
            && view.buf[next * FAT_DIR_ENTRY_SIZE] != FAT_EOD
        {
            let off = slot_offsets(self.meta, &view.chain, next, 1);
            self.io.write_multi_at(&off, 1, &[FAT_EOD])?;
            view.buf[next * FAT_DIR_ENTRY_SIZE] = FAT_EOD;
        }
        let start = slot * FAT_DIR_ENTRY_SIZE;
        view.buf[start..start + raw.len()].copy_from_slice(&raw);
        Ok(())
    }

    /// Mirrors the allocator's counters into both FSInfo sectors.
    fn sync_fsinfo(&mut self) -> FsInjectorResult {
        let fsinfo = Fat32FsInfo::new(
            self.allocator.free_clusters(),
            self.allocator.next_free_hint(),
        );
        for sector in [FAT_FSINFO_SECTOR, FAT_FSINFO_BACKUP_SECTOR] {
            self.io
                .write_struct(self.meta.sector_offset(sector), &fsinfo)?;
        }
        Ok(())
    }
}

impl<IO: ImgIO + ?Sized> FsFileInjector for Fat32Injector<'_, IO> {
    fn write_file(
        &mut self,
        path: &str,
        content: &[u8],
        attr: &FileAttributes,
    ) -> FsInjectorResult<WriteOutcome> {
        let (parent, name) =
            split_parent(path).ok_or(FsInjectorError::InvalidName("path names the root"))?;
        utils::validate_name(name)?;
        let len = u32::try_from(content.len()).map_err(|_| FsInjectorError::FileTooLarge {
            len: content.len() as u64,
        })?;

        let mut view = Fat32Resolver::new(&mut *self.io, self.meta).open_dir(parent)?;
        let existing = view.find(name).cloned();

        let outcome = match existing {
            Some(rec) if rec.entries.is_dir() => {
                return Err(FsInjectorError::Invalid("a directory already has this name"));
            }
            Some(rec) => {
                // the entry keeps pointing at the old chain until the new one is on disk
                let handle = self.store_content(content)?;

                let mut entry = rec.entries.entry;
                entry.set_content(handle.cluster_id, len, attr);
                let off = slot_offsets(self.meta, &view.chain, rec.sfn_slot(), 1);
                self.io
                    .write_multi_at(&off, FAT_DIR_ENTRY_SIZE, zerocopy::IntoBytes::as_bytes(&entry))?;
                let released = self.release_chain(rec.entries.first_cluster())?;
                WriteOutcome::Replaced {
                    units: handle.len(),
                    released,
                }
            }
            None => {
                let short = self.unique_short_name(name, &view)?;
                let handle = self.store_content(content)?;
                let entries = Fat32Entries::file(name, &short, handle.cluster_id, len, attr);
                self.add_entry(&mut view, &entries)?;
                WriteOutcome::Created {
                    units: handle.len(),
                }
            }
        };

        self.sync_fsinfo()?;
        Ok(outcome)
    }

    fn flush(&mut self) -> FsInjectorResult {
        self.sync_fsinfo()?;
        self.io.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::FsResolver;
    use crate::fs::fat32::formatter::*;

    const MIB: u64 = 1024 * 1024;

    fn formatted(buf: &mut Vec<u8>) -> (Fat32Meta, Fat32Allocator) {
        let meta = Fat32Meta::new(33 * MIB, Some("AMT-SETUP")).unwrap();
        buf.resize(meta.size_bytes() as usize, 0);
        let mut io = MemImgIO::new(buf);
        Fat32Formatter::new(&mut io, &meta).format(false).unwrap();
        let alloc = Fat32Allocator::new(&meta);
        (meta, alloc)
    }

    fn attr() -> FileAttributes {
        FileAttributes::new_file()
    }

    #[test]
    fn create_then_read_back() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);

        let data: Vec<u8> = (0..1300u32).map(|i| (i % 251) as u8).collect();
        let out = Fat32Injector::new(&mut io, &mut alloc, &meta)
            .write_file("/Setup.bin", &data, &attr())
            .unwrap();
        assert_eq!(out, WriteOutcome::Created { units: 3 });

        let mut r = Fat32Resolver::new(&mut io, &meta);
        assert_eq!(r.read_file("/Setup.bin").unwrap(), data);
        let names: Vec<String> = r.read_dir("/").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Setup.bin".to_string()]);

        // slack after the data is zero
        let mut tail = [0xFFu8; 236];
        io.read_at(meta.unit_offset(5) + 276, &mut tail).unwrap();
        assert!(tail.iter().all(|&b| b == 0));

        let fsi: Fat32FsInfo = io.read_struct(512).unwrap();
        let (free, next) = (fsi.free_cluster_count, fsi.next_free_cluster);
        assert_eq!(free, meta.cluster_count - 4);
        assert_eq!(next, 6);
    }

    #[test]
    fn rewrite_replaces_in_place() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        {
            let mut inj = Fat32Injector::new(&mut io, &mut alloc, &meta);
            inj.write_file("/Setup.bin", &[1u8; 2000], &attr()).unwrap();
            let out = inj.write_file("/SETUP.BIN", b"short", &attr()).unwrap();
            assert_eq!(out, WriteOutcome::Replaced { units: 1, released: 4 });
            inj.flush().unwrap();
        }
        assert_eq!(alloc.used_units(), 2);

        let mut r = Fat32Resolver::new(&mut io, &meta);
        let entries = r.read_dir("/").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Setup.bin");
        assert_eq!(r.read_file("/Setup.bin").unwrap(), b"short");
    }

    #[test]
    fn failed_rewrite_keeps_old_content() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        {
            let mut inj = Fat32Injector::new(&mut io, &mut alloc, &meta);
            inj.write_file("/Setup.bin", &[1u8; 2000], &attr()).unwrap();
            let left = inj.allocator.remaining_units();
            inj.write_file("/FILL.BIN", &vec![2u8; (left - 2) * 512], &attr())
                .unwrap();

            // more than free + old chain
            let err = inj
                .write_file("/Setup.bin", &vec![3u8; 7 * 512], &attr())
                .unwrap_err();
            assert!(matches!(
                err,
                FsInjectorError::Allocator(FsAllocatorError::OutOfBlocks)
            ));
        }
        assert_eq!(alloc.remaining_units(), 2);

        let mut r = Fat32Resolver::new(&mut io, &meta);
        assert_eq!(r.read_file("/Setup.bin").unwrap(), vec![1u8; 2000]);
        let on_disk = Fat32Allocator::load(&mut io, &meta).unwrap();
        assert_eq!(on_disk.free_clusters(), 2);
    }

    #[test]
    fn empty_file_has_no_cluster() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        let out = Fat32Injector::new(&mut io, &mut alloc, &meta)
            .write_file("/empty", &[], &attr())
            .unwrap();
        assert_eq!(out, WriteOutcome::Created { units: 0 });
        let mut r = Fat32Resolver::new(&mut io, &meta);
        assert_eq!(r.read_file("/empty").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn colliding_short_names_get_tails() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        {
            let mut inj = Fat32Injector::new(&mut io, &mut alloc, &meta);
            inj.write_file("/long file name one.txt", b"1", &attr()).unwrap();
            inj.write_file("/long file name two.txt", b"2", &attr()).unwrap();
        }
        let view = DirView::load(&mut io, &meta, 2).unwrap();
        let shorts: Vec<[u8; 11]> = view.records.iter().map(|r| r.entries.entry.name).collect();
        assert!(shorts.contains(b"LONGFI~1TXT"));
        assert!(shorts.contains(b"LONGFI~2TXT"));

        let mut r = Fat32Resolver::new(&mut io, &meta);
        assert_eq!(r.read_file("/long file name two.txt").unwrap(), b"2");
    }

    #[test]
    fn directory_grows_past_first_cluster() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        {
            let mut inj = Fat32Injector::new(&mut io, &mut alloc, &meta);
            // label + 20 entries > 16 slots per 512-byte cluster
            for i in 0..20 {
                inj.write_file(&format!("/F{i}.BIN"), &[i as u8], &attr()).unwrap();
            }
        }
        let view = DirView::load(&mut io, &meta, 2).unwrap();
        assert_eq!(view.chain.len(), 2);
        let mut r = Fat32Resolver::new(&mut io, &meta);
        assert_eq!(r.read_dir("/").unwrap().len(), 20);
        assert_eq!(r.read_file("/f19.bin").unwrap(), vec![19]);
    }

    #[test]
    fn invalid_names_write_nothing() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        let mut inj = Fat32Injector::new(&mut io, &mut alloc, &meta);
        for bad in ["/", "/a:b", "/x?"] {
            let err = inj.write_file(bad, b"data", &attr()).unwrap_err();
            assert!(err.is_invalid_argument(), "{bad}: {err}");
        }
        drop(inj);
        assert_eq!(alloc.used_units(), 1);
    }

    #[test]
    fn missing_parent() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        let err = Fat32Injector::new(&mut io, &mut alloc, &meta)
            .write_file("/nodir/file", b"x", &attr())
            .unwrap_err();
        assert!(matches!(
            err,
            FsInjectorError::Resolver(crate::core::errors::FsResolverError::NotFound)
        ));
    }

    #[test]
    fn out_of_space() {
        let mut buf = Vec::new();
        let (meta, mut alloc) = formatted(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        let too_big = vec![0u8; meta.cluster_count as usize * 512];
        let err = Fat32Injector::new(&mut io, &mut alloc, &meta)
            .write_file("/big", &too_big, &attr())
            .unwrap_err();
        assert!(matches!(
            err,
            FsInjectorError::Allocator(FsAllocatorError::OutOfBlocks)
        ));
    }
}
