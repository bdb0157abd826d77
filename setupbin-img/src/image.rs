// SPDX-License-Identifier: MIT

//! The output image file.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use imgio::prelude::*;

/// Fixed-length raw image file, owned for the duration of the run.
pub struct DiskImage {
    file: File,
    path: PathBuf,
    size_bytes: u64,
}

/// Creates (or truncates) `path` and sets its length to `total_bytes`.
///
/// The file starts out zero-filled; most host filesystems keep it sparse.
pub fn create_image(path: &Path, total_bytes: u64) -> anyhow::Result<DiskImage> {
    let file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("cannot create image {}", path.display()))?;
    file.set_len(total_bytes)
        .with_context(|| format!("cannot size image {} to {total_bytes} bytes", path.display()))?;
    Ok(DiskImage {
        file,
        path: path.to_path_buf(),
        size_bytes: total_bytes,
    })
}

impl DiskImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Whole-disk view (partition offset 0).
    pub fn as_io(&mut self) -> StdImgIO<'_, File> {
        StdImgIO::new(&mut self.file)
    }

    /// Flushes and syncs the file to stable storage, then closes it.
    pub fn close(self) -> anyhow::Result<()> {
        self.file
            .sync_all()
            .with_context(|| format!("cannot sync image {}", self.path.display()))
    }
}
