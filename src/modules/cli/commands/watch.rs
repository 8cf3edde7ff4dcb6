//! Watch command implementation

use clap::Args;
use portico_core::PorticoError;
use portico_runtime::{shutdown_signal, ConfigStore, Reloader};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Watch command arguments
#[derive(Args, Debug)]
pub struct WatchCommand {
    /// Debounce delay in milliseconds for file changes
    #[arg(long, default_value = "500")]
    pub debounce: u64,
}

impl WatchCommand {
    /// Load once, then reload on every change until Ctrl-C
    pub async fn execute(&self, config_path: &str) -> Result<(), PorticoError> {
        info!("Watching configuration: {}", config_path);

        let store = Arc::new(ConfigStore::new(config_path));
        let initial = store.clone();
        match tokio::task::spawn_blocking(move || initial.reload())
            .await
            .map_err(|e| PorticoError::Internal(e.to_string()))?
        {
            Ok(report) => {
                for warning in &report.warnings {
                    warn!("{}", warning);
                }
            }
            Err(e) => warn!("Initial load rejected, waiting for a fix: {}", e),
        }

        Reloader::new(store.clone())
            .with_debounce(Duration::from_millis(self.debounce))
            .run(shutdown_signal())
            .await?;

        info!("Stopped at configuration generation {}", store.generation());
        Ok(())
    }
}
