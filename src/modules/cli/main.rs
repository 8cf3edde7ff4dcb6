//! Portico CLI
//!
//! Command-line interface for the Portico gateway configuration.

use clap::Parser;
use portico_cli::{Cli, Commands, LogFormat};
use portico_core::PorticoError;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PorticoError> {
    let cli = Cli::parse();
    let config_path = cli.config_path().to_string();

    // Logs go to stderr so `dump` output stays clean
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    match cli.command {
        Commands::Check(cmd) => {
            cmd.execute(&config_path).await?;
        }
        Commands::Dump(cmd) => {
            cmd.execute(&config_path).await?;
        }
        Commands::Watch(cmd) => {
            cmd.execute(&config_path).await?;
        }
        Commands::Init(cmd) => {
            cmd.execute().await?;
        }
        Commands::Completion(cmd) => {
            cmd.execute();
        }
    }

    Ok(())
}
