// SPDX-License-Identifier: MIT

use imgio::prelude::*;

pub use crate::core::checker::*;
use crate::fs::fat32::meta::*;

mod boot;
mod fat;
mod walker;

#[derive(Clone, Debug)]
pub struct Fat32CheckOptions {
    pub phases: VerifyPhases,
    pub fail_fast: bool,
    pub compare_fat_copies: bool,
    /// Count free clusters and compare with FSInfo.
    pub check_fsinfo_consistency: bool,
    /// Report clusters in use that no file or directory reaches.
    pub report_lost_clusters: bool,
    pub max_dirs: usize,
}

impl Default for Fat32CheckOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            fail_fast: false,
            compare_fat_copies: true,
            check_fsinfo_consistency: true,
            report_lost_clusters: true,
            max_dirs: 10_000,
        }
    }
}

impl VerifierOptionsLike for Fat32CheckOptions {
    fn phases(&self) -> VerifyPhases {
        self.phases
    }
    fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

pub struct Fat32Checker<'a, IO: ImgIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a Fat32Meta,
}

impl<'a, IO: ImgIO + ?Sized> Fat32Checker<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a Fat32Meta) -> Self {
        Self { io, meta }
    }

    /// Boot, FAT and root checks only; fails on the first error.
    pub fn fast_check(&mut self) -> FsCheckerResult {
        let opt = Fat32CheckOptions {
            phases: VerifyPhases::BOOT | VerifyPhases::CHAIN | VerifyPhases::ROOT,
            fail_fast: true,
            check_fsinfo_consistency: false,
            ..Default::default()
        };
        let rep = self.check_with(&opt)?;
        if rep.has_error() {
            return Err(FsCheckerError::Invalid("volume failed the fast check"));
        }
        Ok(())
    }
}

impl<IO: ImgIO + ?Sized> FsChecker for Fat32Checker<'_, IO> {
    type Options = Fat32CheckOptions;

    fn check_boot(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        boot::check_boot(self.io, self.meta, rep)
    }

    fn check_chain(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        fat::check_reserved_entries(self.io, self.meta, rep)?;
        if opt.compare_fat_copies {
            fat::compare_fat_copies(self.io, self.meta, rep)?;
        }
        if opt.check_fsinfo_consistency {
            let free = fat::count_free(self.io, self.meta)?;
            boot::check_fsinfo_free(self.io, self.meta, free, rep)?;
        }
        Ok(())
    }

    fn check_root(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        walker::check_root(self.io, self.meta, rep)
    }

    fn check_content(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let mut walker = walker::ContentWalker::new(self.io, self.meta, opt.max_dirs);
        walker.walk(rep)?;
        let (files, dirs, reached) = (walker.files, walker.dirs, walker.claimed_clusters());
        rep.push(Finding::info(
            "DIR.WALK",
            format!("walked {dirs} dir(s), {files} file(s), {reached} cluster(s) in use"),
        ));

        if opt.report_lost_clusters {
            let free = fat::count_free(self.io, self.meta)? as usize;
            let used = self.meta.cluster_count as usize - free;
            if used > reached {
                rep.push(Finding::warn(
                    "FAT.LOST",
                    format!("{} cluster(s) allocated but unreachable", used - reached),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fat::chain;
    use crate::fs::fat32::{allocator::Fat32Allocator, formatter::*, injector::*};

    const MIB: u64 = 1024 * 1024;

    fn populated(buf: &mut Vec<u8>) -> Fat32Meta {
        let meta = Fat32Meta::new(33 * MIB, Some("AMT-SETUP")).unwrap();
        buf.resize(meta.size_bytes() as usize, 0);
        let mut io = MemImgIO::new(buf);
        Fat32Formatter::new(&mut io, &meta).format(false).unwrap();
        let mut alloc = Fat32Allocator::new(&meta);
        let mut inj = Fat32Injector::new(&mut io, &mut alloc, &meta);
        inj.write_file("/Setup.bin", &[7u8; 5000], &Default::default())
            .unwrap();
        inj.flush().unwrap();
        meta
    }

    #[test]
    fn clean_volume_has_no_findings_above_info() {
        let mut buf = Vec::new();
        let meta = populated(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        let rep = Fat32Checker::new(&mut io, &meta).check_all().unwrap();
        assert_eq!(rep.count(Severity::Error), 0, "{rep}");
        assert_eq!(rep.count(Severity::Warn), 0, "{rep}");
        assert!(rep.has_code("DIR.WALK"));
        assert!(Fat32Checker::new(&mut io, &meta).fast_check().is_ok());
    }

    #[test]
    fn fat_mirror_mismatch_is_an_error() {
        let mut buf = Vec::new();
        let meta = populated(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        io.write_u32_at(meta.fat_entry_offset(100, 1), 0x0FFF_FFFF)
            .unwrap();
        let rep = Fat32Checker::new(&mut io, &meta).check_all().unwrap();
        let err = rep.first_error().map(|f| f.code);
        assert_eq!(err, Some("FAT.MIRROR"));
        assert!(Fat32Checker::new(&mut io, &meta).fast_check().is_err());
    }

    #[test]
    fn short_chain_and_lost_cluster() {
        let mut buf = Vec::new();
        let meta = populated(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        // cut the 10-cluster file after its first cluster
        chain::write_chain(&mut io, &meta, &[3]).unwrap();
        let rep = Fat32Checker::new(&mut io, &meta).check_all().unwrap();
        assert!(rep.has_code("FILE.SIZE"));
        assert!(rep.has_code("FAT.LOST"));
        assert!(rep.has_error());
    }

    #[test]
    fn broken_boot_sector() {
        let mut buf = Vec::new();
        let meta = populated(&mut buf);
        let mut io = MemImgIO::new(&mut buf);
        io.write_at(510, &[0, 0]).unwrap();
        let opt = Fat32CheckOptions {
            phases: VerifyPhases::BOOT,
            ..Default::default()
        };
        let rep = Fat32Checker::new(&mut io, &meta).check_with(&opt).unwrap();
        assert!(rep.has_code("VBR.INVALID"));
        assert!(rep.has_code("VBR.MIRROR"));
        assert!(!rep.has_code("DIR.WALK"));
    }
}
