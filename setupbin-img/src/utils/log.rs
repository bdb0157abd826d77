// SPDX-License-Identifier: MIT

//! Prefixed stderr logging that cooperates with the active spinner.

use std::cell::RefCell;
use std::fmt;

use colored::Colorize;
use indicatif::ProgressBar;

use crate::constants::APP_NAME;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

thread_local! {
    static ACTIVE_BAR: RefCell<Option<ProgressBar>> = const { RefCell::new(None) };
}

/// Routes log lines through `bar` until [`release_bar`] is called.
pub(crate) fn attach_bar(bar: &ProgressBar) {
    ACTIVE_BAR.with(|b| *b.borrow_mut() = Some(bar.clone()));
}

pub(crate) fn release_bar() {
    ACTIVE_BAR.with(|b| b.borrow_mut().take());
}

fn prefix(level: LogLevel) -> String {
    let tag = format!("[{APP_NAME}]");
    match level {
        LogLevel::Info => tag.green().to_string(),
        LogLevel::Warn => format!("{} {}", tag.yellow(), "warning:".yellow().bold()),
        LogLevel::Error => format!("{} {}", tag.red(), "error:".red().bold()),
    }
}

#[doc(hidden)]
pub fn emit(level: LogLevel, args: fmt::Arguments<'_>) {
    let line = format!("{} {args}", prefix(level));
    ACTIVE_BAR.with(|b| match b.borrow().as_ref() {
        Some(bar) => bar.suspend(|| eprintln!("{line}")),
        None => eprintln!("{line}"),
    });
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::utils::log::emit($crate::utils::log::LogLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::utils::log::emit($crate::utils::log::LogLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::utils::log::emit($crate::utils::log::LogLevel::Error, format_args!($($arg)*))
    };
}
