mod cli;
mod logging;
mod pipeline;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use rooftop_logging::{rooftop_error, rooftop_info};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    logging::initialize(&cli.log_settings());

    match pipeline::run(&cli) {
        Ok(summary) => {
            rooftop_info!(
                "emitted {} assets into {:?}",
                summary.asset_count(),
                cli.output
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            rooftop_error!("build failed: {}", err);
            eprintln!("rooftop: {err}");
            ExitCode::FAILURE
        }
    }
}
