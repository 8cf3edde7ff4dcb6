//! Hot reload: watch the configuration files and republish on change

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use portico_core::PorticoError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::store::ConfigStore;

/// Default quiet period before a burst of file events triggers a reload
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches the main config file, include directory and middleware compose
/// directory, reloading the store after each burst of changes
pub struct Reloader {
    store: Arc<ConfigStore>,
    debounce: Duration,
}

impl Reloader {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            store,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Directories to watch. The include directory holds the main config
    /// file, so watching it also catches editors that replace files by rename.
    pub fn watched_paths(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let options = self.store.options();
        let mut paths = vec![(options.base_dir.clone(), RecursiveMode::NonRecursive)];
        let compose_dir = options.compose_dir();
        if compose_dir.is_dir() {
            paths.push((compose_dir, RecursiveMode::Recursive));
        }
        paths
    }

    /// Watch until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<(), PorticoError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let Some(path) = relevant_path(&event) {
                        let _ = tx.send(path);
                    }
                }
                Err(e) => warn!("Config watch error: {}", e),
            })
            .map_err(|e| PorticoError::Watch(e.to_string()))?;

        for (path, mode) in self.watched_paths() {
            watcher
                .watch(&path, mode)
                .map_err(|e| PorticoError::Watch(format!("{}: {}", path.display(), e)))?;
            info!("Watching {}", path.display());
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Reloader shutting down");
                    break;
                }
                changed = rx.recv() => {
                    let Some(first) = changed else { break };
                    let count = self.settle(&mut rx).await + 1;
                    info!("{} changed ({} events), reloading", first.display(), count);
                    self.reload().await;
                }
            }
        }

        drop(watcher);
        Ok(())
    }

    /// Swallow events until none arrive for the debounce period
    async fn settle(&self, rx: &mut mpsc::UnboundedReceiver<PathBuf>) -> usize {
        let mut swallowed = 0;
        while let Ok(Some(_)) = tokio::time::timeout(self.debounce, rx.recv()).await {
            swallowed += 1;
        }
        swallowed
    }

    async fn reload(&self) {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.reload()).await {
            Ok(Ok(report)) => {
                for warning in &report.warnings {
                    warn!("{}", warning);
                }
            }
            Ok(Err(e)) => warn!("Reload rejected, previous configuration stays in force: {}", e),
            Err(e) => error!("Reload task failed: {}", e),
        }
    }
}

/// File events that can change the configuration
fn relevant_path(event: &Event) -> Option<PathBuf> {
    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
        return None;
    }
    event.paths.iter().find(|path| is_config_file(path)).cloned()
}

fn is_config_file(path: &Path) -> bool {
    if path.file_name().is_some_and(|name| name == ".env") {
        return true;
    }
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml" | "yaml" | "json")
    )
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => debug!("Received Ctrl-C, shutting down..."),
        _ = terminate => debug!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, EventKind, ModifyKind};
    use std::fs;

    #[test]
    fn test_relevant_paths() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/etc/portico/apps.yml"));
        assert_eq!(relevant_path(&event), Some(PathBuf::from("/etc/portico/apps.yml")));

        let swap = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/portico/.apps.yml.swp"));
        assert_eq!(relevant_path(&swap), None);

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/etc/portico/config.yml"));
        assert_eq!(relevant_path(&access), None);

        assert!(is_config_file(Path::new("/etc/portico/.env")));
    }

    #[test]
    fn test_watched_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ConfigStore::new(dir.path().join("config.yml")));
        assert_eq!(Reloader::new(store.clone()).watched_paths().len(), 1);

        fs::create_dir(dir.path().join("middlewares")).unwrap();
        let paths = Reloader::new(store).watched_paths();
        assert_eq!(paths[1], (dir.path().join("middlewares"), RecursiveMode::Recursive));
    }

    #[tokio::test]
    async fn test_reload_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yml");
        fs::write(&config, "providers:\n  include: [apps.yml]\n").unwrap();
        fs::write(dir.path().join("apps.yml"), "app:\n  port: 3000\n").unwrap();

        let store = Arc::new(ConfigStore::new(&config));
        store.reload().unwrap();
        let mut published = store.subscribe();

        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let reloader = Reloader::new(store.clone()).with_debounce(Duration::from_millis(50));
        let task = tokio::spawn(reloader.run(async {
            let _ = stopped.await;
        }));

        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(dir.path().join("apps.yml"), "app:\n  port: 3000\napi:\n  port: 4000\n").unwrap();

        tokio::time::timeout(Duration::from_secs(10), published.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.current().unwrap().route_count(), 2);

        stop.send(()).unwrap();
        task.await.unwrap().unwrap();
    }
}
