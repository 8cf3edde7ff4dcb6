//! Configuration loading for Portico
//!
//! This crate turns the main config document and its include files into a
//! [`CanonicalConfig`]: placeholder substitution, parsing, reference
//! resolution, decoding, defaulting and invariant checking. Every defect is
//! collected and reported together.

mod access_log;
mod config;
pub mod defaults;
pub mod document;
pub mod encode;
pub mod env;
pub mod loader;
mod middleware;
mod provider;
mod record;
pub mod reference;
mod route;
mod scalar;
pub mod validator;

pub use document::{DocumentFormat, DocumentParser};
pub use encode::{encode, EncodedDocuments};
pub use env::EnvSubstitutor;
pub use loader::{LoadOptions, LoadState, LoadWarning, Loaded, Loader};
pub use reference::{FsSource, LookupError, MemorySource, ReferenceSource};
pub use route::RouteDraft;
pub use validator::ConfigValidator;

use portico_core::{CanonicalConfig, PorticoError};
use std::path::Path;

/// Load a configuration file, resolving include files next to it
pub fn parse_file(path: impl AsRef<Path>) -> Result<Loaded, PorticoError> {
    let path = path.as_ref();
    Loader::from_options(&LoadOptions::for_file(path)).load_file(path)
}

/// Load a configuration from YAML text; include files come from `source`
pub fn parse_string(content: &str, source: impl ReferenceSource) -> Result<CanonicalConfig, PorticoError> {
    Loader::new(source)
        .load_text("config.yml", content)
        .map(|loaded| loaded.config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_config() {
        let yaml = r#"
providers:
  include: [apps.yml]
match_domains: [example.com]
"#;
        let source = MemorySource::new().with_include("apps.yml", "app:\n  host: 10.0.0.5\n  port: 3000\n");
        let config = parse_string(yaml, source).unwrap();
        assert_eq!(config.match_domains, vec!["example.com"]);
        assert_eq!(config.route_count(), 1);
        assert_eq!(config.route("app").unwrap().alias(), "app");
    }
}
