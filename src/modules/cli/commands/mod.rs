//! CLI commands

mod check;
mod completion;
mod dump;
mod init;
mod watch;

pub use check::CheckCommand;
pub use completion::CompletionCommand;
pub use dump::{DumpCommand, DumpFormat};
pub use init::InitCommand;
pub use watch::WatchCommand;

use clap::{Parser, Subcommand, ValueEnum};

/// Portico - configuration for the Portico gateway
#[derive(Parser, Debug)]
#[command(name = "portico")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Main configuration file
    ///
    /// This is a *global* option so it can be specified after subcommands,
    /// e.g. `portico check -f config.yml`.
    #[arg(short = 'f', long = "file", global = true, default_value = "config.yml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the configuration and report every error
    Check(CheckCommand),

    /// Print the canonical configuration in re-loadable form
    Dump(DumpCommand),

    /// Keep the configuration loaded, reloading on file changes
    Watch(WatchCommand),

    /// Write an example configuration
    Init(InitCommand),

    /// Generate shell completions
    #[command(hide = true)]
    Completion(CompletionCommand),
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config_path(&self) -> &str {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        let cli = Cli::try_parse_from(["portico", "check"]).unwrap();
        assert_eq!(cli.config_path(), "config.yml");
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_cli_with_config_after_subcommand() {
        let cli = Cli::try_parse_from(["portico", "dump", "-f", "gateway/config.yml", "--format", "json"]).unwrap();
        assert_eq!(cli.config_path(), "gateway/config.yml");
        let Commands::Dump(dump) = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(dump.format, DumpFormat::Json);
    }

    #[test]
    fn test_unknown_dump_format() {
        assert!(Cli::try_parse_from(["portico", "dump", "--format", "toml"]).is_err());
    }
}
