//! Autotrace - track vehicles and their maintenance history from the
//! command line.

mod app;
mod cli;

use std::io;
use std::process::ExitCode;

use anyhow::Error;
use autotrace_core::ApiError;
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;

/// Directory for daily rolling log files; unset means stderr only
const LOG_DIR_ENV: &str = "AUTOTRACE_LOG_DIR";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must outlive `main`'s work.
fn init_tracing() -> Option<WorkerGuard> {
    // RUST_LOG controls the level (e.g., RUST_LOG=autotrace_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "autotrace.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// One line for the terminal: API errors use their user-facing message.
fn describe_error(err: &Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api_error) => api_error.user_message(),
        None => format!("{:#}", err),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing();
    info!("Autotrace starting");

    let result = match App::new(cli.api_url) {
        Ok(app) => app.run(cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", describe_error(&e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_api_error() {
        let err = Error::from(ApiError::validation("Plate is required"));
        assert_eq!(describe_error(&err), "Plate is required");
    }

    #[test]
    fn test_describe_other_error_keeps_context() {
        let err = anyhow::anyhow!("disk unplugged").context("Failed to read password");
        assert_eq!(describe_error(&err), "Failed to read password: disk unplugged");
    }
}
