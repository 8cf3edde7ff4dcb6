//! Deferred lookups: environment values, include files and middleware compose chains

use portico_core::RawNode;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::document::{DocumentFormat, DocumentParser};
use crate::env::EnvSubstitutor;

/// A failed external lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("'{name}' could not be read: {reason}")]
    Unreadable { name: String, reason: String },
}

/// Key-value provider consulted while references are resolved
pub trait ReferenceSource {
    /// Value of an environment variable
    fn env_var(&self, name: &str) -> Option<String>;

    /// Raw text of an include file, before placeholder substitution
    fn read_include(&self, name: &str) -> Result<String, LookupError>;

    /// Middleware chain defined under `name` in a compose file
    fn middleware_chain(&self, name: &str) -> Result<RawNode, LookupError>;
}

/// Filesystem-backed source: include files under `base_dir`, compose files
/// under `compose_dir`, environment from the process (and optionally `.env`)
#[derive(Debug, Clone)]
pub struct FsSource {
    base_dir: PathBuf,
    compose_dir: PathBuf,
    dotenv: HashMap<String, String>,
}

impl FsSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let compose_dir = base_dir.join("middlewares");
        Self {
            base_dir,
            compose_dir,
            dotenv: HashMap::new(),
        }
    }

    pub fn with_compose_dir(mut self, compose_dir: impl Into<PathBuf>) -> Self {
        self.compose_dir = compose_dir.into();
        self
    }

    /// Read `<base_dir>/.env`; process environment values still take precedence
    pub fn with_dotenv(mut self) -> Self {
        let path = self.base_dir.join(".env");
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                self.dotenv = iter.filter_map(Result::ok).collect();
                debug!("Loaded {} variables from {}", self.dotenv.len(), path.display());
            }
            Err(e) => debug!("No .env file loaded from {}: {}", path.display(), e),
        }
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn compose_dir(&self) -> &Path {
        &self.compose_dir
    }

    fn compose_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.compose_dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yml") | Some("yaml")
                )
            })
            .collect();
        files.sort();
        files
    }
}

impl ReferenceSource for FsSource {
    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .or_else(|| self.dotenv.get(name).cloned())
    }

    fn read_include(&self, name: &str) -> Result<String, LookupError> {
        let path = self.base_dir.join(name);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LookupError::NotFound(name.to_string()),
            _ => LookupError::Unreadable {
                name: name.to_string(),
                reason: e.to_string(),
            },
        })
    }

    fn middleware_chain(&self, name: &str) -> Result<RawNode, LookupError> {
        for path in self.compose_files() {
            let file = path.display().to_string();
            let unreadable = |reason: String| LookupError::Unreadable {
                name: file.clone(),
                reason,
            };
            let text = fs::read_to_string(&path).map_err(|e| unreadable(e.to_string()))?;
            let text = EnvSubstitutor::substitute(&text, |var| self.env_var(var)).map_err(|names| {
                unreadable(format!("unbound environment variables: {}", names.join(", ")))
            })?;
            let document = DocumentParser::parse(&file, &text, DocumentFormat::Yaml)
                .map_err(|e| unreadable(e.to_string()))?;
            if let Some(chain) = document.get(name) {
                return Ok(chain.clone());
            }
        }
        Err(LookupError::NotFound(format!("{}@file", name)))
    }
}

/// In-memory source for tests and for re-decoding encoded documents
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    env: HashMap<String, String>,
    includes: HashMap<String, String>,
    chains: HashMap<String, RawNode>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    pub fn with_include(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.includes.insert(name.into(), text.into());
        self
    }

    pub fn with_chain(mut self, name: impl Into<String>, chain: RawNode) -> Self {
        self.chains.insert(name.into(), chain);
        self
    }
}

impl ReferenceSource for MemorySource {
    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn read_include(&self, name: &str) -> Result<String, LookupError> {
        self.includes
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }

    fn middleware_chain(&self, name: &str) -> Result<RawNode, LookupError> {
        self.chains
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("{}@file", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_fs_source_reads_includes_and_chains() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("apps.yml"), "app:\n  port: 8080\n").unwrap();
        fs::create_dir(dir.path().join("middlewares")).unwrap();
        fs::write(
            dir.path().join("middlewares").join("auth.yml"),
            "secure:\n  - use: redirect_http\n",
        )
        .unwrap();

        let source = FsSource::new(dir.path());
        assert!(source.read_include("apps.yml").unwrap().contains("8080"));
        assert_eq!(
            source.read_include("missing.yml"),
            Err(LookupError::NotFound("missing.yml".to_string()))
        );
        let chain = source.middleware_chain("secure").unwrap();
        assert_eq!(chain.as_seq().map(|items| items.len()), Some(1));
        assert!(matches!(
            source.middleware_chain("other"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_dotenv_fills_missing_variables() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "PORTICO_TEST_ONLY_IN_DOTENV=from-file\n").unwrap();

        let source = FsSource::new(dir.path()).with_dotenv();
        assert_eq!(
            source.env_var("PORTICO_TEST_ONLY_IN_DOTENV").as_deref(),
            Some("from-file")
        );
        assert_eq!(source.env_var("PORTICO_TEST_NOT_DEFINED_ANYWHERE"), None);
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new()
            .with_env("TOKEN", "abc")
            .with_include("a.yml", "x: {}");
        assert_eq!(source.env_var("TOKEN").as_deref(), Some("abc"));
        assert!(source.read_include("a.yml").is_ok());
        assert!(source.middleware_chain("none").is_err());
    }
}
