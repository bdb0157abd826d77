// SPDX-License-Identifier: MIT

use imgio::prelude::*;

use crate::core::{checker::*, fat::chain, utils::path_utils::join_paths};
use crate::fs::fat32::{meta::*, resolver::DirView};

/// Root directory chain and volume label.
pub fn check_root<IO: ImgIO + ?Sized>(
    io: &mut IO,
    meta: &Fat32Meta,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    let root = match DirView::load(io, meta, meta.root_unit()) {
        Ok(view) => view,
        Err(e) => {
            rep.push(Finding::err("ROOT.CHAIN", format!("root directory unreadable: {e}")));
            return Ok(());
        }
    };
    rep.push(Finding::info(
        "ROOT.CHAIN",
        format!("root directory spans {} cluster(s)", root.chain.len()),
    ));

    match root.volume_label() {
        Some(rec) if rec.entries.entry.name == meta.volume_label => {
            rep.push(Finding::info("ROOT.LABEL", format!("label {:?}", meta.label_str())))
        }
        Some(_) => rep.push(Finding::warn(
            "ROOT.LABEL",
            "root label entry differs from boot sector label",
        )),
        None => rep.push(Finding::warn("ROOT.LABEL", "no volume label entry in root")),
    }
    Ok(())
}

/// Walks every directory from the root and checks each file's chain
/// against its size, flagging clusters claimed twice.
pub struct ContentWalker<'a, IO: ImgIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a Fat32Meta,
    claimed: Vec<bool>,
    pub files: usize,
    pub dirs: usize,
    max_dirs: usize,
}

impl<'a, IO: ImgIO + ?Sized> ContentWalker<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a Fat32Meta, max_dirs: usize) -> Self {
        Self {
            io,
            meta,
            claimed: vec![false; meta.cluster_count as usize],
            files: 0,
            dirs: 0,
            max_dirs,
        }
    }

    /// Clusters reached from the root so far.
    pub fn claimed_clusters(&self) -> usize {
        self.claimed.iter().filter(|&&c| c).count()
    }

    fn claim(&mut self, path: &str, chain: &[u32], rep: &mut VerifyReport) {
        for &c in chain {
            let idx = (c - self.meta.first_data_unit()) as usize;
            if std::mem::replace(&mut self.claimed[idx], true) {
                rep.push(Finding::err(
                    "CHAIN.XLINK",
                    format!("{path}: cluster {c} is already used by another chain"),
                ));
                return;
            }
        }
    }

    pub fn walk(&mut self, rep: &mut VerifyReport) -> FsCheckerResult {
        self.walk_dir("/", self.meta.root_unit(), rep)
    }

    fn walk_dir(&mut self, path: &str, cluster: u32, rep: &mut VerifyReport) -> FsCheckerResult {
        if self.dirs >= self.max_dirs {
            rep.push(Finding::warn("DIR.LIMIT", "directory limit reached, walk stopped"));
            return Ok(());
        }
        self.dirs += 1;

        let view = match DirView::load(self.io, self.meta, cluster) {
            Ok(v) => v,
            Err(e) => {
                rep.push(Finding::err("DIR.READ", format!("{path}: {e}")));
                return Ok(());
            }
        };
        self.claim(path, &view.chain, rep);

        for rec in view.records.iter().filter(|r| !r.is_dot()) {
            if rec.entries.is_volume_label() {
                continue;
            }
            let name = match rec.entries.name() {
                Ok(n) => n,
                Err(e) => {
                    rep.push(Finding::err("DIR.NAME", format!("{path}: {e}")));
                    continue;
                }
            };
            let child = join_paths(path, &name);
            let first = rec.entries.first_cluster();

            if rec.entries.is_dir() {
                if first == 0 || first == self.meta.root_unit() {
                    rep.push(Finding::err("DIR.LOOP", format!("{child}: points at the root")));
                } else {
                    self.walk_dir(&child, first, rep)?;
                }
                continue;
            }

            self.files += 1;
            self.check_file(&child, first, rec.entries.size(), rep)?;
        }
        Ok(())
    }

    fn check_file(
        &mut self,
        path: &str,
        first: u32,
        size: u32,
        rep: &mut VerifyReport,
    ) -> FsCheckerResult {
        if size == 0 {
            if first != 0 {
                rep.push(Finding::warn(
                    "FILE.EMPTY",
                    format!("{path}: empty file owns cluster {first}"),
                ));
            }
            return Ok(());
        }

        let chain = match chain::read_chain(self.io, self.meta, first) {
            Ok(c) => c,
            Err(e) => {
                rep.push(Finding::err("FILE.CHAIN", format!("{path}: {e}")));
                return Ok(());
            }
        };
        let expected = (size as usize).div_ceil(self.meta.unit_size());
        if chain.len() < expected {
            rep.push(Finding::err(
                "FILE.SIZE",
                format!("{path}: {size} bytes need {expected} clusters, chain has {}", chain.len()),
            ));
        } else if chain.len() > expected {
            rep.push(Finding::warn(
                "FILE.SIZE",
                format!("{path}: chain has {} clusters, {expected} needed", chain.len()),
            ));
        }
        self.claim(path, &chain, rep);
        Ok(())
    }
}
