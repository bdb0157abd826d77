// SPDX-License-Identifier: MIT

use imgio::prelude::*;

pub use crate::core::resolver::*;

use crate::core::{fat::chain, utils::path_utils::*};
use crate::fs::fat32::{
    dir::{self, DirRecord},
    meta::*,
};

/// A directory loaded into memory: its chain, raw slots and parsed entries.
#[derive(Debug, Clone)]
pub struct DirView {
    pub cluster: u32,
    pub chain: Vec<u32>,
    pub buf: Vec<u8>,
    pub records: Vec<DirRecord>,
}

impl DirView {
    pub fn load<IO: ImgIO + ?Sized>(
        io: &mut IO,
        meta: &Fat32Meta,
        cluster: u32,
    ) -> FsResolverResult<Self> {
        let chain = chain::read_chain(io, meta, cluster)?;
        let buf = read_chain_bytes(io, meta, &chain, chain.len() * meta.unit_size())?;
        let records = dir::parse_dir(&buf)?;
        Ok(Self {
            cluster,
            chain,
            buf,
            records,
        })
    }

    /// Live entry named `name` (case-insensitive), ignoring the label and
    /// dot entries.
    pub fn find(&self, name: &str) -> Option<&DirRecord> {
        self.records
            .iter()
            .filter(|r| !r.entries.is_volume_label() && !r.is_dot())
            .find(|r| r.entries.name_eq(name))
    }

    pub fn volume_label(&self) -> Option<&DirRecord> {
        self.records.iter().find(|r| r.entries.is_volume_label())
    }
}

/// Reads the first `len` bytes stored in `chain`, one contiguous run at a time.
pub fn read_chain_bytes<IO: ImgIO + ?Sized>(
    io: &mut IO,
    meta: &Fat32Meta,
    chain: &[u32],
    len: usize,
) -> ImgIOResult<Vec<u8>> {
    let cs = meta.unit_size();
    let mut out = vec![0u8; len];
    let mut done = 0usize;
    for (start, run) in chain::runs(chain) {
        if done >= len {
            break;
        }
        let n = (run as usize * cs).min(len - done);
        io.read_in_chunks(meta.unit_offset(start), &mut out[done..done + n], BLOCK_BUF_SIZE)?;
        done += n;
    }
    Ok(out)
}

const BLOCK_BUF_SIZE: usize = imgio::BLOCK_BUF_SIZE;

pub struct Fat32Resolver<'a, IO: ImgIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a Fat32Meta,
}

enum Resolved {
    Root,
    Entry(DirRecord),
}

impl<'a, IO: ImgIO + ?Sized> Fat32Resolver<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a Fat32Meta) -> Self {
        Self { io, meta }
    }

    /// Loads the directory at `path`.
    pub fn open_dir(&mut self, path: &str) -> FsResolverResult<DirView> {
        let cluster = match self.resolve(path)? {
            Resolved::Root => self.meta.root_unit(),
            Resolved::Entry(rec) if rec.entries.is_dir() => self.dir_cluster(&rec),
            Resolved::Entry(_) => return Err(FsResolverError::NotADirectory),
        };
        DirView::load(self.io, self.meta, cluster)
    }

    /// Volume label stored in the root directory, if any.
    pub fn volume_label(&mut self) -> FsResolverResult<Option<[u8; 11]>> {
        let root = DirView::load(self.io, self.meta, self.meta.root_unit())?;
        Ok(root.volume_label().map(|r| r.entries.entry.name))
    }

    fn dir_cluster(&self, rec: &DirRecord) -> u32 {
        match rec.entries.first_cluster() {
            0 => self.meta.root_unit(),
            c => c,
        }
    }

    fn resolve(&mut self, path: &str) -> FsResolverResult<Resolved> {
        let components = split_path(path);
        let mut cluster = self.meta.root_unit();
        let mut found = Resolved::Root;

        for (i, comp) in components.iter().enumerate() {
            if i > 0 {
                match &found {
                    Resolved::Entry(rec) if rec.entries.is_dir() => {
                        cluster = self.dir_cluster(rec);
                    }
                    _ => return Err(FsResolverError::NotADirectory),
                }
            }
            let view = DirView::load(self.io, self.meta, cluster)?;
            let rec = view.find(comp).ok_or(FsResolverError::NotFound)?;
            found = Resolved::Entry(rec.clone());
        }
        Ok(found)
    }
}

impl<IO: ImgIO + ?Sized> FsResolver for Fat32Resolver<'_, IO> {
    fn read_dir(&mut self, path: &str) -> FsResolverResult<Vec<FsDirEntry>> {
        let view = self.open_dir(path)?;
        let mut out = view
            .records
            .iter()
            .filter(|r| !r.entries.is_volume_label() && !r.is_dot())
            .map(|r| {
                Ok(FsDirEntry {
                    name: r.entries.name()?,
                    size: r.entries.size() as u64,
                    attr: r.entries.attr(),
                })
            })
            .collect::<FsResolverResult<Vec<_>>>()?;
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn read_file(&mut self, path: &str) -> FsResolverResult<Vec<u8>> {
        let rec = match self.resolve(path)? {
            Resolved::Entry(rec) if !rec.entries.is_dir() => rec,
            _ => return Err(FsResolverError::NotAFile),
        };
        let size = rec.entries.size() as usize;
        if size == 0 {
            return Ok(Vec::new());
        }

        let chain = chain::read_chain(self.io, self.meta, rec.entries.first_cluster())?;
        crate::ensure!(
            chain.len() * self.meta.unit_size() >= size,
            FsResolverError::Invalid("cluster chain shorter than file size")
        );
        Ok(read_chain_bytes(self.io, self.meta, &chain, size)?)
    }

    fn read_attributes(&mut self, path: &str) -> FsResolverResult<FileAttributes> {
        match self.resolve(path)? {
            Resolved::Root => Ok(FileAttributes::new_dir()),
            Resolved::Entry(rec) => Ok(rec.entries.attr()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fat32::{
        constant::*,
        formatter::*,
        types::Fat32Entries,
        utils::to_short_name,
    };

    const MIB: u64 = 1024 * 1024;

    /// Formats a volume and hand-places `hello.txt` (3 bytes) in cluster 3.
    fn volume(buf: &mut Vec<u8>) -> Fat32Meta {
        let meta = Fat32Meta::new(33 * MIB, Some("TEST")).unwrap();
        buf.resize(meta.size_bytes() as usize, 0);
        let mut io = MemImgIO::new(buf);
        Fat32Formatter::new(&mut io, &meta).format(false).unwrap();

        chain::write_chain(&mut io, &meta, &[3]).unwrap();
        io.write_at(meta.unit_offset(3), b"hey").unwrap();
        let short = to_short_name("hello.txt");
        let mut slots = Vec::new();
        Fat32Entries::file("hello.txt", &short, 3, 3, &FileAttributes::new_file())
            .to_raw_buffer(&mut slots);
        io.write_at(meta.unit_offset(2) + FAT_DIR_ENTRY_SIZE as u64, &slots)
            .unwrap();
        meta
    }

    #[test]
    fn lists_and_reads_root() {
        let mut buf = Vec::new();
        let meta = volume(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        let mut r = Fat32Resolver::new(&mut io, &meta);

        let entries = r.read_dir("/").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "hello.txt");
        assert_eq!(entries[0].size, 3);
        assert!(entries[0].attr.archive);

        assert_eq!(r.read_file("/HELLO.TXT").unwrap(), b"hey");
        assert!(r.exists("/hello.txt").unwrap());
        assert!(!r.exists("/nope").unwrap());
        assert_eq!(r.walk_files("/").unwrap(), vec!["/hello.txt".to_string()]);
        assert_eq!(r.volume_label().unwrap(), Some(*b"TEST       "));
        assert!(r.read_attributes("/").unwrap().dir);
    }

    #[test]
    fn error_kinds() {
        let mut buf = Vec::new();
        let meta = volume(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        let mut r = Fat32Resolver::new(&mut io, &meta);

        assert!(matches!(r.read_file("/"), Err(FsResolverError::NotAFile)));
        assert!(matches!(
            r.read_dir("/hello.txt"),
            Err(FsResolverError::NotADirectory)
        ));
        assert!(matches!(
            r.read_file("/hello.txt/x"),
            Err(FsResolverError::NotADirectory)
        ));
        assert!(matches!(r.read_file("/missing"), Err(FsResolverError::NotFound)));
    }

    #[test]
    fn truncated_chain_is_reported() {
        let mut buf = Vec::new();
        let meta = volume(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        // claim 600 bytes in a one-cluster chain
        let slot = meta.unit_offset(2) + 32 + 28;
        io.write_u32_at(slot, 600).unwrap();
        let mut r = Fat32Resolver::new(&mut io, &meta);
        assert!(matches!(
            r.read_file("/hello.txt"),
            Err(FsResolverError::Invalid(_))
        ));
    }
}
