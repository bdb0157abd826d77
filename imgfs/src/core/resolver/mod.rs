// SPDX-License-Identifier: MIT

pub mod attr;

pub use attr::FileAttributes;

pub use crate::core::errors::{FsResolverError, FsResolverResult};

use crate::core::utils::path_utils::*;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsDirEntry {
    pub name: String,
    pub size: u64,
    pub attr: FileAttributes,
}

impl FsDirEntry {
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.attr.dir
    }
}

/// Read access to the content of a formatted volume.
///
/// Paths are `/`-separated and absolute; name comparison follows the
/// filesystem's own rules (case-insensitive on FAT).
pub trait FsResolver {
    /// Immediate children of the directory at `path`, sorted by name.
    fn read_dir(&mut self, path: &str) -> FsResolverResult<Vec<FsDirEntry>>;

    /// Full content of the regular file at `path`.
    fn read_file(&mut self, path: &str) -> FsResolverResult<Vec<u8>>;

    /// Attributes of the entry at `path` (the root is a directory).
    fn read_attributes(&mut self, path: &str) -> FsResolverResult<FileAttributes>;

    fn exists(&mut self, path: &str) -> FsResolverResult<bool> {
        match self.read_attributes(path) {
            Ok(_) => Ok(true),
            Err(FsResolverError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Paths of every regular file below `path`, depth first.
    fn walk_files(&mut self, path: &str) -> FsResolverResult<Vec<String>> {
        let mut out = Vec::new();
        for entry in self.read_dir(path)? {
            let child = join_paths(path, &entry.name);
            if entry.is_dir() {
                out.extend(self.walk_files(&child)?);
            } else {
                out.push(child);
            }
        }
        Ok(out)
    }
}
