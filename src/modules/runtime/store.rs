//! Published configuration snapshot and load sessions

use arc_swap::ArcSwapOption;
use portico_core::{CanonicalConfig, PorticoError};
use portico_parser::{LoadOptions, LoadWarning, Loader};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Outcome of a load that was published
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub generation: u64,
    pub route_count: usize,
    pub warnings: Vec<String>,
}

/// A published configuration together with the generation it was published as
#[derive(Debug)]
pub struct Snapshot {
    pub generation: u64,
    pub config: Arc<CanonicalConfig>,
}

/// The most recent load that was rejected
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Generation still in force when the load was rejected
    pub kept_generation: u64,
    pub error_count: usize,
    pub message: String,
    #[serde(skip)]
    pub at: SystemTime,
}

/// Holds the canonical configuration currently in force.
///
/// Readers never block: `current()` is a lock-free load of the published
/// snapshot. Loads are serialized through the session lock, and a rejected
/// load leaves the previous snapshot in place.
pub struct ConfigStore {
    config_path: PathBuf,
    options: LoadOptions,
    snapshot: ArcSwapOption<Snapshot>,
    session: Mutex<()>,
    last_rejection: Mutex<Option<Rejection>>,
    published: watch::Sender<u64>,
}

impl ConfigStore {
    /// Store for a config file, with include files resolved next to it
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let options = LoadOptions::for_file(&config_path);
        Self::with_options(config_path, options)
    }

    pub fn with_options(config_path: impl Into<PathBuf>, options: LoadOptions) -> Self {
        let (published, _) = watch::channel(0);
        Self {
            config_path: config_path.into(),
            options,
            snapshot: ArcSwapOption::empty(),
            session: Mutex::new(()),
            last_rejection: Mutex::new(None),
            published,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Configuration currently in force, if any load has succeeded
    pub fn current(&self) -> Option<Arc<CanonicalConfig>> {
        self.snapshot().map(|snapshot| snapshot.config.clone())
    }

    /// Published configuration and its generation, read as one value
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.load_full()
    }

    /// Generation of the published snapshot (0 before the first successful load)
    pub fn generation(&self) -> u64 {
        self.snapshot
            .load()
            .as_ref()
            .map_or(0, |snapshot| snapshot.generation)
    }

    pub fn last_rejection(&self) -> Option<Rejection> {
        self.last_rejection
            .lock()
            .ok()
            .and_then(|rejection| rejection.clone())
    }

    /// Receiver notified with the new generation after every published load
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.published.subscribe()
    }

    /// Run a full load and publish it when it reaches `Ready`
    pub fn reload(&self) -> Result<LoadReport, PorticoError> {
        let _session = self
            .session
            .lock()
            .map_err(|_| PorticoError::Internal("load session lock poisoned".to_string()))?;

        let loaded = match Loader::from_options(&self.options).load_file(&self.config_path) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.reject(&e);
                return Err(e);
            }
        };

        let route_count = loaded.config.route_count();
        let warnings = loaded.warnings.iter().map(LoadWarning::to_string).collect();
        let generation = self.generation() + 1;
        self.snapshot.store(Some(Arc::new(Snapshot {
            generation,
            config: Arc::new(loaded.config),
        })));
        self.published.send_replace(generation);

        info!(
            "Published configuration generation {} ({} routes)",
            generation, route_count
        );
        Ok(LoadReport {
            generation,
            route_count,
            warnings,
        })
    }

    fn reject(&self, e: &PorticoError) {
        let kept_generation = self.generation();
        let error_count = e.config_errors().map_or(1, |errors| errors.len());
        if kept_generation > 0 {
            warn!(
                "Configuration rejected with {} errors, keeping generation {}",
                error_count, kept_generation
            );
        } else {
            error!("Configuration rejected with {} errors, nothing published", error_count);
        }

        let rejection = Rejection {
            kept_generation,
            error_count,
            message: e.to_string(),
            at: SystemTime::now(),
        };
        if let Ok(mut last) = self.last_rejection.lock() {
            *last = Some(rejection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn write_config(dir: &Path, apps: &str) -> PathBuf {
        let path = dir.join("config.yml");
        fs::write(&path, "providers:\n  include: [apps.yml]\n").unwrap();
        fs::write(dir.join("apps.yml"), apps).unwrap();
        path
    }

    #[test]
    fn test_reload_publishes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(write_config(dir.path(), "app:\n  port: 3000\n"));
        assert!(store.current().is_none());
        assert_eq!(store.generation(), 0);

        let report = store.reload().unwrap();
        assert_eq!(report.generation, 1);
        assert_eq!(report.route_count, 1);
        assert_eq!(store.current().unwrap().route_count(), 1);
        assert_eq!(*store.subscribe().borrow(), 1);
    }

    #[test]
    fn test_rejected_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(write_config(dir.path(), "app:\n  port: 3000\n"));
        store.reload().unwrap();
        let before = store.current().unwrap();

        fs::write(dir.path().join("apps.yml"), "app:\n  port: 70000\n  scheme: ftp\n").unwrap();
        let err = store.reload().unwrap_err();
        assert!(err.is_rejection());

        assert!(Arc::ptr_eq(&before, &store.current().unwrap()));
        assert_eq!(store.generation(), 1);
        let rejection = store.last_rejection().unwrap();
        assert_eq!(rejection.kept_generation, 1);
        assert_eq!(rejection.error_count, 1);
    }

    #[test]
    fn test_concurrent_reloads_are_serialized() {
        const LOADS: usize = 8;
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "app:\n  port: 3000\nsite:\n  port: 4000\n");
        let expected = portico_parser::parse_file(&path).unwrap().config;
        let store = Arc::new(ConfigStore::new(path));

        let done = AtomicBool::new(false);
        let mut generations: Vec<u64> = std::thread::scope(|scope| {
            let reader = scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    if let Some(snapshot) = store.snapshot() {
                        assert!(snapshot.generation >= 1);
                        assert_eq!(*snapshot.config, expected);
                    }
                }
            });
            let loaders: Vec<_> = (0..LOADS)
                .map(|_| scope.spawn(|| store.reload().map(|report| report.generation)))
                .collect();
            let results: Vec<_> = loaders.into_iter().map(|h| h.join()).collect();
            done.store(true, Ordering::Release);
            reader.join().unwrap();
            results.into_iter().map(|r| r.unwrap().unwrap()).collect()
        });

        generations.sort_unstable();
        assert_eq!(generations, (1..=LOADS as u64).collect::<Vec<_>>());
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.generation, LOADS as u64);
        assert_eq!(store.generation(), LOADS as u64);
        assert_eq!(*store.current().unwrap(), expected);
        assert_eq!(*store.subscribe().borrow(), LOADS as u64);
    }

    #[test]
    fn test_generation_travels_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(write_config(dir.path(), "app:\n  port: 3000\n"));
        assert!(store.snapshot().is_none());
        store.reload().unwrap();

        fs::write(dir.path().join("apps.yml"), "app:\n  port: 3000\nsite:\n  port: 4000\n").unwrap();
        store.reload().unwrap();
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.config.route_count(), 2);
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.yml"));
        assert!(matches!(store.reload(), Err(PorticoError::Io(_))));
        assert!(store.current().is_none());
        assert_eq!(store.last_rejection().unwrap().kept_generation, 0);
    }

    #[test]
    fn test_override_warnings_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "providers:\n  include: [a.yml, b.yml]\n").unwrap();
        fs::write(dir.path().join("a.yml"), "app:\n  port: 3000\n").unwrap();
        fs::write(dir.path().join("b.yml"), "app:\n  port: 4000\n").unwrap();

        let report = ConfigStore::new(path).reload().unwrap();
        assert_eq!(report.route_count, 1);
        assert_eq!(report.warnings.len(), 1);
    }
}
