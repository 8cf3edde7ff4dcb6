//! Load pipeline: raw text in, canonical configuration (or every defect) out

use portico_core::{
    CanonicalConfig, ConfigError, ConfigErrors, FieldPath, PorticoError, RawNode, RouteEntry,
};
use portico_types::{validate_text, Kind};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{decode_config, include_names};
use crate::document::{DocumentFormat, DocumentParser};
use crate::env::EnvSubstitutor;
use crate::reference::{FsSource, ReferenceSource};
use crate::route::{decode_routes, RouteDraft};
use crate::validator::ConfigValidator;

/// Stages of one load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Parsing,
    ReferenceResolving,
    Decoding,
    Defaulting,
    InvariantChecking,
    Ready,
    Rejected,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::Parsing => "parsing",
            LoadState::ReferenceResolving => "reference resolving",
            LoadState::Decoding => "decoding",
            LoadState::Defaulting => "defaulting",
            LoadState::InvariantChecking => "invariant checking",
            LoadState::Ready => "ready",
            LoadState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Non-fatal findings of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A route name defined in an earlier include file was replaced by a later one
    RouteOverride {
        name: String,
        previous: String,
        current: String,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::RouteOverride {
                name,
                previous,
                current,
            } => write!(
                f,
                "route '{}' from {} is overridden by the definition in {}",
                name, previous, current
            ),
        }
    }
}

/// Result of a load that reached `Ready`
#[derive(Debug, Clone)]
pub struct Loaded {
    pub config: CanonicalConfig,
    pub warnings: Vec<LoadWarning>,
}

/// Where and how configuration is loaded from disk
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory include files are resolved against
    pub base_dir: PathBuf,
    /// Middleware compose directory (default: `<base_dir>/middlewares`)
    pub compose_dir: Option<PathBuf>,
    /// Read `<base_dir>/.env` before looking up environment variables
    pub dotenv: bool,
    /// Force a document format instead of detecting it from the extension
    pub format: Option<DocumentFormat>,
}

impl LoadOptions {
    /// Options for a config file, with include files next to it
    pub fn for_file(path: &Path) -> Self {
        let base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            base_dir,
            compose_dir: None,
            dotenv: true,
            format: None,
        }
    }

    pub fn compose_dir(&self) -> PathBuf {
        self.compose_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("middlewares"))
    }

    /// Filesystem reference source described by these options
    pub fn source(&self) -> FsSource {
        let source = FsSource::new(&self.base_dir).with_compose_dir(self.compose_dir());
        if self.dotenv {
            source.with_dotenv()
        } else {
            source
        }
    }
}

/// Runs the load pipeline against one reference source
pub struct Loader<S: ReferenceSource> {
    source: S,
    format: Option<DocumentFormat>,
}

impl Loader<FsSource> {
    pub fn from_options(options: &LoadOptions) -> Self {
        Self {
            source: options.source(),
            format: options.format,
        }
    }
}

impl<S: ReferenceSource> Loader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            format: None,
        }
    }

    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the main config file from disk
    pub fn load_file(&self, path: &Path) -> Result<Loaded, PorticoError> {
        let text = std::fs::read_to_string(path)?;
        let format = self.format.unwrap_or_else(|| DocumentFormat::detect(path));
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.load(&name, &text, format)
    }

    /// Load a main document given as text (YAML unless a format was set)
    pub fn load_text(&self, name: &str, text: &str) -> Result<Loaded, PorticoError> {
        self.load(name, text, self.format.unwrap_or(DocumentFormat::Yaml))
    }

    fn load(&self, name: &str, text: &str, format: DocumentFormat) -> Result<Loaded, PorticoError> {
        let result = self.run(name, text, format);
        match &result {
            Ok(loaded) => info!(
                "Configuration {} is {}: {} routes, {} warnings",
                name,
                LoadState::Ready,
                loaded.config.route_count(),
                loaded.warnings.len()
            ),
            Err(PorticoError::Invalid(errors)) => warn!(
                "Configuration {} {}: {} errors",
                name,
                LoadState::Rejected,
                errors.len()
            ),
            Err(e) => warn!("Configuration {} {}: {}", name, LoadState::Rejected, e),
        }
        result
    }

    fn run(&self, name: &str, text: &str, format: DocumentFormat) -> Result<Loaded, PorticoError> {
        transition(name, LoadState::Parsing);
        let document = self.parse(name, text, format)?;

        transition(name, LoadState::ReferenceResolving);
        let mut errors = ConfigErrors::new();
        let includes = self.resolve_includes(&document, &mut errors);

        transition(name, LoadState::Decoding);
        let config = errors.absorb(decode_config(&self.source, &document));
        let mut drafts = Vec::new();
        for (file, node) in &includes {
            if let Some(routes) = errors.absorb(decode_routes(&self.source, file, node)) {
                drafts.extend(routes);
            }
        }
        let mut config = match config {
            Some(config) if errors.is_empty() => config,
            _ => return Err(PorticoError::Invalid(errors)),
        };

        transition(name, LoadState::Defaulting);
        drafts.iter_mut().for_each(RouteDraft::apply_defaults);
        let (drafts, warnings) = merge(drafts);

        transition(name, LoadState::InvariantChecking);
        ConfigValidator::new().validate(&drafts, config.entrypoint.as_ref())?;

        config.routes = drafts
            .into_iter()
            .map(|draft| {
                let entry = RouteEntry {
                    source: draft.source,
                    route: draft.route,
                };
                (draft.name, entry)
            })
            .collect();
        Ok(Loaded { config, warnings })
    }

    /// Substitute placeholders and parse; unbound names reject the document outright
    fn parse(&self, name: &str, text: &str, format: DocumentFormat) -> Result<RawNode, PorticoError> {
        let text = EnvSubstitutor::substitute(text, |var| self.source.env_var(var))
            .map_err(|unbound| PorticoError::Invalid(unbound_errors(name, unbound)))?;
        DocumentParser::parse(name, &text, format)
    }

    /// Load every include file; a file that cannot be loaded contributes no routes
    fn resolve_includes(&self, document: &RawNode, errors: &mut ConfigErrors) -> Vec<(String, RawNode)> {
        let mut includes = Vec::new();
        let list = FieldPath::of("providers").key("include");

        for (i, name) in include_names(document).into_iter().enumerate() {
            let Some(name) = name.filter(|name| validate_text(Kind::IncludeFile, name).is_ok()) else {
                continue;
            };
            let path = list.index(i);
            let text = match self.source.read_include(&name) {
                Ok(text) => text,
                Err(e) => {
                    errors.push(ConfigError::unresolved(path, format!("include file {}", e)));
                    continue;
                }
            };
            let text = match EnvSubstitutor::substitute(&text, |var| self.source.env_var(var)) {
                Ok(text) => text,
                Err(unbound) => {
                    errors.extend(unbound_errors(&name, unbound));
                    continue;
                }
            };
            match DocumentParser::parse(&name, &text, DocumentFormat::Yaml) {
                Ok(node) => {
                    debug!("Resolved include file {}", name);
                    includes.push((name, node));
                }
                Err(e) => errors.push(ConfigError::unresolved(path, e.to_string())),
            }
        }
        includes
    }
}

fn transition(name: &str, state: LoadState) {
    debug!(document = name, state = %state, "Load state transition");
}

fn unbound_errors(document: &str, names: Vec<String>) -> ConfigErrors {
    names
        .iter()
        .map(|var| ConfigError::unbound_placeholder(FieldPath::of(document), var))
        .collect::<Vec<_>>()
        .into()
}

/// Keep one route per name; a later include file replaces an earlier one
fn merge(drafts: Vec<RouteDraft>) -> (Vec<RouteDraft>, Vec<LoadWarning>) {
    let mut warnings = Vec::new();
    let mut by_name: BTreeMap<String, RouteDraft> = BTreeMap::new();

    for draft in drafts {
        if let Some(previous) = by_name.get(&draft.name) {
            warn!(
                "Route '{}' from {} is overridden by {}",
                draft.name, previous.source, draft.source
            );
            warnings.push(LoadWarning::RouteOverride {
                name: draft.name.clone(),
                previous: previous.source.clone(),
                current: draft.source.clone(),
            });
        }
        by_name.insert(draft.name.clone(), draft);
    }

    (by_name.into_values().collect(), warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::MemorySource;
    use portico_core::ErrorKind;

    fn loader(source: MemorySource) -> Loader<MemorySource> {
        Loader::new(source)
    }

    #[test]
    fn test_load_routes_from_includes() {
        let source = MemorySource::new()
            .with_include("apps.yml", "app:\n  port: 3000\n")
            .with_include("more.yml", "db:\n  port: '5432:5432'\n");
        let loaded = loader(source)
            .load_text("config.yml", "providers:\n  include: [apps.yml, more.yml]\n")
            .unwrap();
        assert_eq!(loaded.config.route_count(), 2);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.config.routes["db"].source, "more.yml");
    }

    #[test]
    fn test_later_include_overrides_route() {
        let source = MemorySource::new()
            .with_include("a.yml", "app:\n  port: 3000\n")
            .with_include("b.yml", "app:\n  port: 4000\n");
        let loaded = loader(source)
            .load_text("config.yml", "providers:\n  include: [a.yml, b.yml]\n")
            .unwrap();
        assert_eq!(loaded.config.route_count(), 1);
        assert_eq!(loaded.config.routes["app"].source, "b.yml");
        assert_eq!(
            loaded.warnings,
            vec![LoadWarning::RouteOverride {
                name: "app".to_string(),
                previous: "a.yml".to_string(),
                current: "b.yml".to_string(),
            }]
        );
    }

    #[test]
    fn test_unbound_placeholders_in_main_document() {
        let err = loader(MemorySource::new())
            .load_text("config.yml", "providers:\n  docker:\n    a: $HOST_A\n    b: ${HOST_B}\n    c: $HOST_A\n")
            .unwrap_err();
        let errors = err.config_errors().unwrap();
        assert_eq!(errors.count(ErrorKind::UnboundPlaceholder), 2);
        assert!(errors.iter().all(|e| e.path.to_string() == "config.yml"));
    }

    #[test]
    fn test_placeholders_substituted_before_validation() {
        let source = MemorySource::new().with_env("DOCKER_HOST", "tcp://10.0.2.1:2375");
        let loaded = loader(source)
            .load_text("config.yml", "providers:\n  docker:\n    remote: $DOCKER_HOST\n")
            .unwrap();
        assert_eq!(loaded.config.providers.docker["remote"], "tcp://10.0.2.1:2375");
    }

    #[test]
    fn test_decode_errors_from_main_and_includes_are_aggregated() {
        let source = MemorySource::new().with_include("apps.yml", "app:\n  port: -1\n");
        let err = loader(source)
            .load_text("config.yml", "providers:\n  include: [apps.yml]\nmatch_domain: [x]\n")
            .unwrap_err();
        assert!(err.is_rejection());
        let paths: Vec<String> = err.config_errors().unwrap().iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["match_domain", "apps.yml.app.port"]);
    }

    #[test]
    fn test_parse_error() {
        let err = loader(MemorySource::new()).load_text("config.yml", "providers: [").unwrap_err();
        assert!(matches!(err, PorticoError::Parse { .. }));
    }

    #[test]
    fn test_load_options_for_file() {
        let options = LoadOptions::for_file(Path::new("/etc/portico/config.yml"));
        assert_eq!(options.base_dir, PathBuf::from("/etc/portico"));
        assert_eq!(options.compose_dir(), PathBuf::from("/etc/portico/middlewares"));
        assert_eq!(LoadOptions::for_file(Path::new("config.yml")).base_dir, PathBuf::from("."));
    }
}
