//! schemadrift command-line entry point.

use anyhow::Context;
use clap::Parser;
use schemadrift::cli::Cli;
use schemadrift::{run, DriftError};
use schemadrift_logging::{init_logging, LogConfig, Verbosity};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.wants_json();

    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    match init_logging(LogConfig::new("schemadrift").with_verbosity(verbosity)) {
        Ok(handle) => {
            if let Some(path) = handle.log_file {
                debug!(path = %path.display(), "Logging to file");
            }
        }
        Err(err) => eprintln!("Warning: {err:#}"),
    }

    let cwd = match working_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("Warning: {err:#}");
            PathBuf::from(".")
        }
    };

    match run(cli, &cwd) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            if json_mode {
                print_json_error(&err);
            } else {
                eprintln!("ERROR ({}): {}", err.kind(), err);
            }
            ExitCode::from(err.exit_code())
        }
    }
}

fn working_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().context("Failed to determine working directory")
}

fn print_json_error(err: &DriftError) {
    let payload = serde_json::json!({
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
            "exit_code": err.exit_code(),
        }
    });
    println!("{payload}");
}
