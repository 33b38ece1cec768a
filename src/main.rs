//! conda-env-update - Conda environment buildpack
//!
//! Entry point for both lifecycle phases. Installed as `bin/detect` and
//! `bin/build`, the program name selects the phase.

use clap::Parser;
use conda_env_update::cli::args::lifecycle_args;
use conda_env_update::cli::{commands, Cli, Commands};
use conda_env_update::error::CondaEnvResult;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CondaEnvResult<ExitCode> {
    let cli = Cli::parse_from(lifecycle_args(std::env::args_os()));

    // stdout carries the build log, diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log_level.filter_directive()))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let app_dir = cli.app_dir()?;
    let buildpack_dir = cli.buildpack_dir();

    match cli.command {
        Commands::Detect(args) => commands::detect(args, app_dir).await,
        Commands::Build(args) => {
            commands::build(args, app_dir, &buildpack_dir?, &cli.conda).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
