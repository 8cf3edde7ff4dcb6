//! Check command implementation

use clap::Args;
use portico_core::PorticoError;
use portico_parser::parse_file;
use tracing::info;

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Treat route override warnings as errors
    #[arg(long)]
    pub deny_warnings: bool,
}

impl CheckCommand {
    /// Load the configuration once; a rejection carries every error found
    pub async fn execute(&self, config_path: &str) -> Result<(), PorticoError> {
        info!("Checking configuration: {}", config_path);

        let loaded = parse_file(config_path)?;
        for warning in &loaded.warnings {
            println!("warning: {}", warning);
        }
        if self.deny_warnings && !loaded.warnings.is_empty() {
            return Err(PorticoError::Internal(format!(
                "{} warning(s) denied by --deny-warnings",
                loaded.warnings.len()
            )));
        }

        println!(
            "{}: ok, {} routes from {} include files",
            config_path,
            loaded.config.route_count(),
            loaded.config.providers.include.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_check_reports_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "providers:\n  include: [missing.yml]\n").unwrap();

        let err = CheckCommand { deny_warnings: false }
            .execute(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_deny_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "providers:\n  include: [a.yml, b.yml]\n").unwrap();
        fs::write(dir.path().join("a.yml"), "app:\n  port: 3000\n").unwrap();
        fs::write(dir.path().join("b.yml"), "app:\n  port: 4000\n").unwrap();
        let path = path.to_str().unwrap();

        assert!(CheckCommand { deny_warnings: false }.execute(path).await.is_ok());
        assert!(CheckCommand { deny_warnings: true }.execute(path).await.is_err());
    }
}
