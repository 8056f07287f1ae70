//! CLI entry point for uget.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use uget_core::{ExitStatus, SecureTransportProvider};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs).
    // Usage errors exit 1 rather than clap's default 2.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitStatus::Failure.into()
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info).
    // Diagnostics go to stderr so `-O -` keeps stdout for the body.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(status) => status.into(),
        Err(e) => {
            error!("{e:#}");
            ExitStatus::Failure.into()
        }
    }
}

async fn run(args: Args) -> Result<ExitStatus> {
    let config = args.into_config().context("invalid command line")?;

    let secure = SecureTransportProvider::detect();
    if secure.is_none() {
        debug!("secure transport not available; https URLs will be rejected");
    }

    let status = uget_core::download(&config, secure.as_ref())
        .await
        .context("cannot start download")?;
    debug!(code = status.code(), "session finished");
    Ok(status)
}
