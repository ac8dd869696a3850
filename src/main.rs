use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use roster_search::cli::{self, Cli};
use roster_search::observability::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let config = match cli.resolve_config(&project_root) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.logging.filter.as_deref());

    match cli::run(&cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
