// SPDX-License-Identifier: MIT

pub use crate::core::errors::{FsInjectorError, FsInjectorResult};

use crate::core::resolver::attr::FileAttributes;

/// What `write_file` did to the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new directory entry was added.
    Created { units: usize },
    /// An existing file was truncated and rewritten in place; its old units
    /// went back to the allocator first.
    Replaced { units: usize, released: usize },
}

impl WriteOutcome {
    #[inline]
    pub fn units(&self) -> usize {
        match *self {
            WriteOutcome::Created { units } | WriteOutcome::Replaced { units, .. } => units,
        }
    }
}

/*
  Injector contract:

  - write_file(path, content, attr)
      * The parent directory of `path` must exist.
      * The name is validated before any byte is written.
      * If `path` names an existing regular file, its chain is released, a
        new chain is allocated for `content`, and the existing directory
        entry is updated in place (size, first cluster, time).
      * Otherwise a new entry set is appended to the parent directory, which
        grows by one cluster when it has no free slot run long enough.
      * Data is written before the directory entry that points at it.

  - flush()
      * Persists allocation bookkeeping (e.g. FSInfo) and flushes the IO.
*/
pub trait FsFileInjector {
    fn write_file(
        &mut self,
        path: &str,
        content: &[u8],
        attr: &FileAttributes,
    ) -> FsInjectorResult<WriteOutcome>;

    fn flush(&mut self) -> FsInjectorResult {
        Ok(())
    }
}
