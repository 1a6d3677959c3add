//! dotplan CLI entry point.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use dotplan::cli::{Cli, CommandDispatcher};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// The request cannot be satisfied by the catalog.
const EXIT_RESOLUTION: u8 = 1;
/// Bad command-line or environment configuration.
const EXIT_CONFIG: u8 = 2;
/// Transport, filesystem and other runtime failures.
const EXIT_RUNTIME: u8 = 3;

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("dotplan=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dotplan=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("dotplan starting with args: {:?}", cli);

    let config = match cli.engine_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let dispatcher = CommandDispatcher::new(config);
    let mut stdout = std::io::stdout().lock();

    let code = match dispatcher.dispatch(&cli, &mut stdout) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_resolution_error() {
                ExitCode::from(EXIT_RESOLUTION)
            } else {
                ExitCode::from(EXIT_RUNTIME)
            }
        }
    };
    let _ = stdout.flush();
    code
}
