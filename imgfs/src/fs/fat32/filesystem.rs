// SPDX-License-Identifier: MIT

use imgio::prelude::*;

use crate::core::{errors::*, traits::*};
use crate::fs::fat32::{
    allocator::Fat32Allocator,
    checker::{Fat32CheckOptions, Fat32Checker, VerifyReport},
    constant::*,
    formatter::Fat32Formatter,
    injector::Fat32Injector,
    meta::*,
    resolver::Fat32Resolver,
    types::Fat32Vbr,
};

/// A FAT32 volume opened on `io`, addressed from the start of the volume.
///
/// Ties the formatter, allocator, injector, resolver and checker to one
/// geometry so callers only deal with paths and bytes.
pub struct Fat32Volume<'a, IO: ImgIO + ?Sized> {
    io: &'a mut IO,
    meta: Fat32Meta,
    allocator: Fat32Allocator,
}

impl<'a, IO: ImgIO + ?Sized> Fat32Volume<'a, IO> {
    /// Formats `size_bytes` of `io` and returns the empty volume.
    pub fn format(
        io: &'a mut IO,
        size_bytes: u64,
        params: &Fat32Params<'_>,
        full_format: bool,
    ) -> FsResult<Self> {
        let meta = Fat32Meta::from_params(size_bytes, params)?;
        {
            let mut fmt = Fat32Formatter::new(&mut *io, &meta);
            fmt.format(full_format)?;
            fmt.flush()?;
        }
        let allocator = Fat32Allocator::new(&meta);
        Ok(Self {
            io,
            meta,
            allocator,
        })
    }

    /// Opens an existing volume from its boot sector.
    pub fn open(io: &'a mut IO) -> FsResult<Self> {
        let vbr: Fat32Vbr = io.read_struct(FAT_VBR_SECTOR)?;
        let meta = Fat32Meta::from_vbr(&vbr)?;
        let allocator = Fat32Allocator::load(&mut *io, &meta)?;
        Ok(Self {
            io,
            meta,
            allocator,
        })
    }

    pub fn meta(&self) -> &Fat32Meta {
        &self.meta
    }

    pub fn free_clusters(&self) -> u32 {
        self.allocator.free_clusters()
    }

    pub fn write_file(
        &mut self,
        path: &str,
        content: &[u8],
        attr: &FileAttributes,
    ) -> FsResult<WriteOutcome> {
        let mut inj = Fat32Injector::new(&mut *self.io, &mut self.allocator, &self.meta);
        Ok(inj.write_file(path, content, attr)?)
    }

    pub fn read_file(&mut self, path: &str) -> FsResult<Vec<u8>> {
        Ok(Fat32Resolver::new(&mut *self.io, &self.meta).read_file(path)?)
    }

    pub fn read_dir(&mut self, path: &str) -> FsResult<Vec<FsDirEntry>> {
        Ok(Fat32Resolver::new(&mut *self.io, &self.meta).read_dir(path)?)
    }

    /// Label from the root directory entry, falling back to the boot sector.
    pub fn volume_label(&mut self) -> FsResult<String> {
        let raw = Fat32Resolver::new(&mut *self.io, &self.meta)
            .volume_label()?
            .unwrap_or(self.meta.volume_label);
        Ok(String::from_utf8_lossy(&raw).trim_end().to_string())
    }

    pub fn check(&mut self) -> FsResult<VerifyReport> {
        Ok(Fat32Checker::new(&mut *self.io, &self.meta).check_all()?)
    }

    pub fn check_with(&mut self, opt: &Fat32CheckOptions) -> FsResult<VerifyReport> {
        Ok(Fat32Checker::new(&mut *self.io, &self.meta).check_with(opt)?)
    }

    pub fn flush(&mut self) -> FsResult {
        Fat32Injector::new(&mut *self.io, &mut self.allocator, &self.meta).flush()?;
        Ok(())
    }
}
