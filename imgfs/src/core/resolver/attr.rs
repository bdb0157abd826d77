// SPDX-License-Identifier: MIT

use time::OffsetDateTime;

/// Portable subset of file metadata carried by directory entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub read_only: bool,
    pub hidden: bool,
    pub system: bool,
    pub archive: bool,
    pub dir: bool,
    /// Last write time; `None` lets the filesystem pick its fixed timestamp.
    pub modified: Option<OffsetDateTime>,
}

impl FileAttributes {
    pub fn new_dir() -> Self {
        Self {
            dir: true,
            ..Default::default()
        }
    }

    /// Regular file with the archive bit set, as freshly written files are.
    pub fn new_file() -> Self {
        Self {
            archive: true,
            ..Default::default()
        }
    }

    pub fn set_read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    pub fn set_hidden(mut self, value: bool) -> Self {
        self.hidden = value;
        self
    }

    pub fn set_system(mut self, value: bool) -> Self {
        self.system = value;
        self
    }

    pub fn set_modified(mut self, ts: OffsetDateTime) -> Self {
        self.modified = Some(ts);
        self
    }

    /// Compares flags only, ignoring timestamps.
    pub fn structural_eq(&self, other: &Self) -> bool {
        self.read_only == other.read_only
            && self.hidden == other.hidden
            && self.system == other.system
            && self.archive == other.archive
            && self.dir == other.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let d = FileAttributes::new_dir();
        assert!(d.dir && !d.archive);
        let f = FileAttributes::new_file();
        assert!(!f.dir && f.archive && f.modified.is_none());
    }

    #[test]
    fn structural_eq_ignores_time() {
        let a = FileAttributes::new_file().set_hidden(true);
        let b = a.clone().set_modified(OffsetDateTime::UNIX_EPOCH);
        assert!(a.structural_eq(&b));
        assert_ne!(a, b);
        assert!(!a.structural_eq(&a.clone().set_read_only(true)));
        assert!(!a.structural_eq(&a.clone().set_system(true)));
    }
}
