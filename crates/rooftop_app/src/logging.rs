//! Logger initialization for the rooftop binary.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogDestination {
    /// Append to the log file.
    File,
    /// Write to the terminal.
    Terminal,
    /// Write to both file and terminal.
    Both,
}

impl LogDestination {
    fn to_terminal(self) -> bool {
        matches!(self, Self::Terminal | Self::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, Self::File | Self::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub destination: LogDestination,
    pub level: LevelFilter,
    pub file: PathBuf,
}

/// Installs the global logger.
///
/// A log file that cannot be opened is reported on stderr and skipped;
/// terminal output still goes ahead when requested.
pub fn initialize(settings: &LogSettings) {
    let (loggers, file_error) = build_loggers(settings);
    if let Some(err) = file_error {
        eprintln!(
            "Warning: Could not open log file at {:?}: {}",
            settings.file, err
        );
    }
    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

fn build_loggers(settings: &LogSettings) -> (Vec<Box<dyn SharedLogger>>, Option<io::Error>) {
    let config = build_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    let mut file_error = None;

    if settings.destination.to_terminal() {
        loggers.push(TermLogger::new(
            settings.level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if settings.destination.to_file() {
        match open_log_file(&settings.file) {
            Ok(file) => loggers.push(WriteLogger::new(settings.level, config, file)),
            Err(err) => file_error = Some(err),
        }
    }
    (loggers, file_error)
}

fn build_config() -> Config {
    // Drop transport-level noise from reqwest and hyper.
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build()
}

/// Successive builds append to one running log.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
