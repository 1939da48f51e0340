// Colorized wrappers for logging

use colored::Colorize;
use fern::Dispatch;
use log::{LevelFilter, SetLoggerError};

/// Crates whose records pass the verbosity filter.
const TARGETS: [&str; 3] = ["padweaved", "padweave_device", "padweave_profile"];

fn stamp(message: &str) -> String {
    let now = chrono::Local::now().format("%Y.%m.%d %H:%M:%S").to_string();
    format!("[{now}] {message}")
}

pub fn error(message: &str) {
    log::error!("{}", stamp(message).bright_red());
}

pub fn warning(message: &str) {
    log::warn!("{}", stamp(message).bright_yellow());
}

pub fn info(message: &str) {
    log::info!("{}", stamp(message));
}

pub fn debug(message: &str) {
    log::debug!("{}", stamp(message).dimmed());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::logging::error(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        $crate::logging::info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_debug {
    ($($arg:tt)*) => {
        $crate::logging::debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::logging::warning(&format!($($arg)*))
    };
}

/// Setup the logger.
///
/// Library records go through the same filter as the daemon's own, so
/// `verbose` also shows merge and activation decisions.
pub fn setup(verbose: bool, no_color: bool) -> Result<(), SetLoggerError> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut dispatch = Dispatch::new().level(LevelFilter::Error);
    for target in TARGETS {
        dispatch = dispatch.level_for(target, log_level);
    }
    dispatch.chain(std::io::stdout()).apply()?;

    if no_color {
        colored::control::set_override(false);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_prefixes_local_time() {
        let line = stamp("Demo pad bound");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Demo pad bound"));
        // "[YYYY.MM.DD HH:MM:SS] "
        assert_eq!(line.find(']'), Some(20));
    }
}
