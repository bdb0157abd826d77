// SPDX-License-Identifier: MIT

mod types;

pub use types::{
    Finding, ReportDisplay, ReportDisplayOpts, Severity, VerifierOptionsLike, VerifyPhases,
    VerifyReport,
};

pub use crate::core::errors::{FsCheckerError, FsCheckerResult};

/// Read-only consistency checks over a formatted volume.
///
/// Each phase appends findings to the report; an `Err` means the check
/// itself could not run (I/O failure), not that the volume is inconsistent.
pub trait FsChecker {
    type Options: VerifierOptionsLike + Default;

    fn check_with(&mut self, opt: &Self::Options) -> FsCheckerResult<VerifyReport> {
        let mut rep = VerifyReport::default();
        let _ = self.run_phase(opt, &mut rep, VerifyPhases::BOOT, Self::check_boot)?
            && self.run_phase(opt, &mut rep, VerifyPhases::CHAIN, Self::check_chain)?
            && self.run_phase(opt, &mut rep, VerifyPhases::ROOT, Self::check_root)?
            && self.run_phase(opt, &mut rep, VerifyPhases::CONTENT, Self::check_content)?;
        Ok(rep)
    }

    fn check_all(&mut self) -> FsCheckerResult<VerifyReport> {
        self.check_with(&Self::Options::default())
    }

    fn check_boot(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }

    fn check_chain(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }

    fn check_root(&mut self, _opt: &Self::Options, _rep: &mut VerifyReport) -> FsCheckerResult {
        Ok(())
    }

    fn check_content(
        &mut self,
        _opt: &Self::Options,
        _rep: &mut VerifyReport,
    ) -> FsCheckerResult {
        Ok(())
    }

    /// Runs `f` if `phase` is enabled; returns `false` when fail-fast
    /// should stop the remaining phases.
    fn run_phase<F>(
        &mut self,
        opt: &Self::Options,
        rep: &mut VerifyReport,
        phase: VerifyPhases,
        f: F,
    ) -> FsCheckerResult<bool>
    where
        F: Fn(&mut Self, &Self::Options, &mut VerifyReport) -> FsCheckerResult,
    {
        if opt.phases().contains(phase) {
            f(self, opt, rep)?;
            if opt.fail_fast() && rep.has_error() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
