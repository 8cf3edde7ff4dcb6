//! Root configuration model

use portico_types::Duration;
use serde::Serialize;
use std::collections::BTreeMap;

use super::middleware::MiddlewareChain;
use super::provider::{Autocert, Notification};
use super::route::Route;
use super::types::{AccessLog, HomepageSettings};

/// The fully validated, immutable configuration graph handed to the runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalConfig {
    /// Certificate management (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocert: Option<Autocert>,

    /// Entrypoint middlewares and access log (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Entrypoint>,

    /// Route sources and notification targets; always present
    pub providers: Providers,

    /// Domains routes are matched under
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_domains: Vec<String>,

    /// Homepage settings (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<HomepageSettings>,

    /// Grace period before shutdown (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_shutdown: Option<Duration>,

    /// Routes from every include file, keyed by route name
    #[serde(skip)]
    pub routes: BTreeMap<String, RouteEntry>,
}

impl CanonicalConfig {
    /// Find a route by name
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.get(name).map(|entry| &entry.route)
    }

    /// Find a route by alias
    pub fn find_by_alias(&self, alias: &str) -> Option<(&str, &Route)> {
        self.routes
            .iter()
            .find(|(_, entry)| entry.route.alias() == alias)
            .map(|(name, entry)| (name.as_str(), &entry.route))
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Route names grouped under the include file they came from
    pub fn routes_by_source(&self) -> BTreeMap<&str, Vec<(&str, &Route)>> {
        let mut grouped: BTreeMap<&str, Vec<(&str, &Route)>> = BTreeMap::new();
        for (name, entry) in &self.routes {
            grouped
                .entry(entry.source.as_str())
                .or_default()
                .push((name.as_str(), &entry.route));
        }
        grouped
    }
}

/// A route together with the include file that defined it
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub source: String,
    pub route: Route,
}

/// Entrypoint configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entrypoint {
    #[serde(skip_serializing_if = "MiddlewareChain::is_empty")]
    pub middlewares: MiddlewareChain,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_log: Option<AccessLog>,
}

/// Providers section (include files, docker hosts, agents, notifications)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Providers {
    /// Route definition files, relative to the config directory
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Docker host name to docker host URL
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub docker: BTreeMap<String, String>,

    /// Agent addresses (host:port)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notification: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::route::FileServerRoute;
    use serde_json::json;

    fn entry(source: &str, alias: &str) -> RouteEntry {
        RouteEntry {
            source: source.to_string(),
            route: Route::FileServer(FileServerRoute {
                alias: alias.to_string(),
                root: "/srv".to_string(),
                path_patterns: Vec::new(),
                middlewares: MiddlewareChain::default(),
                homepage: None,
                access_log: None,
                healthcheck: None,
            }),
        }
    }

    #[test]
    fn test_empty_config_keeps_providers() {
        let config = CanonicalConfig::default();
        assert_eq!(serde_json::to_value(&config).unwrap(), json!({"providers": {}}));
    }

    #[test]
    fn test_route_lookup() {
        let mut config = CanonicalConfig::default();
        config.routes.insert("docs".to_string(), entry("a.yml", "docs.example.com"));
        config.routes.insert("files".to_string(), entry("b.yml", "files"));
        config.routes.insert("more".to_string(), entry("a.yml", "more"));

        assert!(config.route("docs").is_some());
        assert_eq!(config.find_by_alias("files").map(|(name, _)| name), Some("files"));
        assert_eq!(config.route_count(), 3);

        let grouped = config.routes_by_source();
        assert_eq!(grouped["a.yml"].len(), 2);
        assert_eq!(grouped["b.yml"].len(), 1);
    }
}
