#![deny(missing_docs)]
//! Shared logging utilities for the rooftop workspace.
//!
//! Library crates never install a logger. They emit through the `rooftop_*`
//! macros below, which forward to the `log` facade under the [`TARGET`]
//! target so hosts can filter plugin output separately from their own.

/// Log target used by every `rooftop_*` macro.
pub const TARGET: &str = "rooftop";

/// Logs a trace-level message under the rooftop target.
#[macro_export]
macro_rules! rooftop_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the rooftop target.
#[macro_export]
macro_rules! rooftop_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the rooftop target.
#[macro_export]
macro_rules! rooftop_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the rooftop target.
#[macro_export]
macro_rules! rooftop_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the rooftop target.
#[macro_export]
macro_rules! rooftop_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Maps a `-v` repetition count onto a level filter.
///
/// Zero is `Info`, one is `Debug`, anything higher is `Trace`.
pub fn level_for_verbosity(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test binary thread may have won the race.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
