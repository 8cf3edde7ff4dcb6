//! Error types for Portico

use std::fmt;

use portico_types::{PrimitiveError, UnknownAlias};
use thiserror::Error;

use crate::path::FieldPath;

/// Closed set of defect categories reported for a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    UnknownConstruct,
    MissingField,
    UnexpectedField,
    PatternMismatch,
    RangeViolation,
    DuplicateAlias,
    UnresolvedReference,
    InvariantViolation,
    UnboundPlaceholder,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownConstruct => "UnknownConstruct",
            ErrorKind::MissingField => "MissingField",
            ErrorKind::UnexpectedField => "UnexpectedField",
            ErrorKind::PatternMismatch => "PatternMismatch",
            ErrorKind::RangeViolation => "RangeViolation",
            ErrorKind::DuplicateAlias => "DuplicateAlias",
            ErrorKind::UnresolvedReference => "UnresolvedReference",
            ErrorKind::InvariantViolation => "InvariantViolation",
            ErrorKind::UnboundPlaceholder => "UnboundPlaceholder",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path-qualified configuration defect
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {kind}: {message}")]
pub struct ConfigError {
    pub path: FieldPath,
    pub kind: ErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(path: FieldPath, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    pub fn missing_field(path: FieldPath, variant: &str) -> Self {
        let field = path.last_key().unwrap_or("<field>").to_string();
        Self::new(
            path,
            ErrorKind::MissingField,
            format!("missing required field '{}' for {}", field, variant),
        )
    }

    pub fn unexpected_field(path: FieldPath, variant: &str, suggestion: Option<&str>) -> Self {
        let field = path.last_key().unwrap_or("<field>").to_string();
        let mut message = format!("unexpected field '{}' for {}", field, variant);
        if let Some(suggestion) = suggestion {
            message.push_str(&format!(" (did you mean '{}'?)", suggestion));
        }
        Self::new(path, ErrorKind::UnexpectedField, message)
    }

    pub fn unknown_construct(path: FieldPath, err: &UnknownAlias) -> Self {
        Self::new(path, ErrorKind::UnknownConstruct, err.to_string())
    }

    pub fn primitive(path: FieldPath, err: &PrimitiveError) -> Self {
        let kind = match err {
            PrimitiveError::Pattern { .. } => ErrorKind::PatternMismatch,
            PrimitiveError::Range { .. } => ErrorKind::RangeViolation,
        };
        Self::new(path, kind, err.to_string())
    }

    /// A value of the wrong shape (e.g. a sequence where a string is expected)
    pub fn wrong_type(path: FieldPath, expected: &str, found: &str) -> Self {
        Self::new(
            path,
            ErrorKind::PatternMismatch,
            format!("expected {}, found {}", expected, found),
        )
    }

    pub fn range(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::RangeViolation, message)
    }

    pub fn invariant(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::InvariantViolation, message)
    }

    pub fn unresolved(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::UnresolvedReference, message)
    }

    pub fn unbound_placeholder(path: FieldPath, name: &str) -> Self {
        Self::new(
            path,
            ErrorKind::UnboundPlaceholder,
            format!("environment variable '{}' is not set", name),
        )
    }
}

/// Ordered list of every defect found in one load attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigErrors(Vec<ConfigError>);

impl ConfigErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ConfigError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, other: ConfigErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.0.iter()
    }

    /// Number of errors of the given kind
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.0.iter().filter(|e| e.kind == kind).count()
    }

    /// `Ok(value)` when nothing was collected, otherwise every collected error
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, ConfigErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Merge the outcome of an independently decoded fragment
    pub fn absorb<T>(&mut self, result: std::result::Result<T, ConfigErrors>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(errors) => {
                self.extend(errors);
                None
            }
        }
    }
}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<ConfigError>> for ConfigErrors {
    fn from(errors: Vec<ConfigError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigErrors {
    type Item = &'a ConfigError;
    type IntoIter = std::slice::Iter<'a, ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

/// Main error type for Portico operations
#[derive(Error, Debug)]
pub enum PorticoError {
    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be parsed into a raw tree
    #[error("Parse error in {document}: {message}")]
    Parse { document: String, message: String },

    /// The configuration was rejected
    #[error("Configuration rejected with {} error(s):\n{0}", .0.len())]
    Invalid(ConfigErrors),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File watcher error
    #[error("Watch error: {0}")]
    Watch(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PorticoError {
    /// Returns true if the load reached a verdict and the verdict was `Rejected`
    pub fn is_rejection(&self) -> bool {
        matches!(self, PorticoError::Invalid(_))
    }

    /// The collected configuration errors of a rejected load
    pub fn config_errors(&self) -> Option<&ConfigErrors> {
        match self {
            PorticoError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ConfigErrors> for PorticoError {
    fn from(errors: ConfigErrors) -> Self {
        PorticoError::Invalid(errors)
    }
}

/// Result type alias using PorticoError
pub type Result<T> = std::result::Result<T, PorticoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use portico_types::{Duration, Kind};

    #[test]
    fn test_primitive_error_kinds() {
        let path = FieldPath::of("timeout_shutdown");
        let err = Duration::parse("soon").unwrap_err();
        let config_err = ConfigError::primitive(path.clone(), &err);
        assert_eq!(config_err.kind, ErrorKind::PatternMismatch);
        assert!(config_err.message.contains("duration"));

        let err = PrimitiveError::range(Kind::Port, "70000");
        assert_eq!(ConfigError::primitive(path, &err).kind, ErrorKind::RangeViolation);
    }

    #[test]
    fn test_missing_and_unexpected_messages() {
        let path = FieldPath::of("autocert").key("email");
        let err = ConfigError::missing_field(path, "autocert provider 'cloudflare'");
        assert_eq!(
            err.to_string(),
            "autocert.email: MissingField: missing required field 'email' for autocert provider 'cloudflare'"
        );

        let path = FieldPath::of("autocert").key("emial");
        let err = ConfigError::unexpected_field(path, "autocert", Some("email"));
        assert!(err.message.ends_with("(did you mean 'email'?)"));
    }

    #[test]
    fn test_aggregation() {
        let mut errors = ConfigErrors::new();
        assert_eq!(errors.clone().into_result(1), Ok(1));

        let value = errors.absorb::<u8>(Err(ConfigError::invariant(
            FieldPath::of("routes"),
            "broken",
        )
        .into()));
        assert!(value.is_none());
        errors.push(ConfigError::unresolved(FieldPath::of("providers"), "missing"));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.count(ErrorKind::InvariantViolation), 1);
        assert_eq!(errors.to_string().lines().count(), 2);
    }

    #[test]
    fn test_rejection() {
        let err = PorticoError::from(ConfigErrors::from(ConfigError::invariant(
            FieldPath::of("x"),
            "bad",
        )));
        assert!(err.is_rejection());
        assert_eq!(err.config_errors().map(|e| e.len()), Some(1));
        assert!(!PorticoError::Internal("x".into()).is_rejection());
    }
}
