use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod cli;
mod command;
mod companion;
mod settings;

use cli::Cli;
use command::CheckOptions;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = CheckOptions {
        settings_path: cli.settings,
        cli_program: cli.cli_program,
    };

    let outcome = command::run_check(&options).await?;
    Ok(ExitCode::from(outcome.exit_code()))
}
