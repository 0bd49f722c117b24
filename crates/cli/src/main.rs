use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use hookwarden_core::config::{Config, LoggingConfig};
use tracing_subscriber::EnvFilter;

mod cli;
mod tools;

use cli::{Cli, Commands};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Hooks(args) => {
            crate::cli::hooks::list(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Match(args) => {
            crate::cli::hooks::matching(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => crate::cli::run::run(args, &config).await,
        Commands::Exec(args) => crate::cli::exec::run(args, &config).await,
    }
}

/// Logs go to stderr; stdout carries command output only.
/// RUST_LOG wins over `--verbose`, which wins over the configured level.
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let log_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
