use std::path::PathBuf;

use clap::{ArgAction, Parser};

use rooftop_logging::level_for_verbosity;

use crate::logging::{LogDestination, LogSettings};

/// rooftop - bake Rooftop CMS content into a static build
#[derive(Parser, Debug)]
#[command(name = "rooftop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (`.ron` or `.json`)
    #[arg(short, long, default_value = "rooftop.ron")]
    pub config: PathBuf,

    /// Project root; template paths and includes resolve against it
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Directory receiving the JSON artifact and rendered pages
    #[arg(short, long, default_value = "public")]
    pub output: PathBuf,

    /// API token, overriding the one in the settings file
    #[arg(long, env = "ROOFTOP_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Log file used by `--log file` and `--log both`; appended to
    #[arg(long, default_value = "rooftop.log")]
    pub log_file: PathBuf,

    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            destination: self.log,
            level: level_for_verbosity(self.verbose),
            file: self.log_file.clone(),
        }
    }
}
