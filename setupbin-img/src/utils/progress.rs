// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::utils::log;

/// Spinner naming the pipeline stage currently running.
///
/// While it lives, `log_*!` lines are printed above it instead of through it.
/// Hidden automatically when stderr is not a terminal.
pub struct StageSpinner {
    bar: ProgressBar,
    started: Instant,
}

impl StageSpinner {
    pub fn start(first_stage: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
            bar.set_style(style);
        }
        bar.set_message(first_stage.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        log::attach_bar(&bar);
        Self {
            bar,
            started: Instant::now(),
        }
    }

    pub fn stage(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn finish(self) -> Duration {
        self.elapsed()
    }
}

impl Drop for StageSpinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
        log::release_bar();
    }
}
