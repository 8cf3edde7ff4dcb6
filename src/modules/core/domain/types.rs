//! Shared configuration records: health checks, homepage metadata and access logs

use portico_types::{AccessLogFormat, Cidr, Duration, FieldMode, HttpMethod, StatusCodeRange};
use serde::Serialize;
use std::collections::BTreeMap;

use super::RawNode;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Health check configuration of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    /// Disable health checking (default: false)
    pub disable: bool,

    /// Path probed on the target (default: "/")
    pub path: String,

    /// Probe with GET instead of HEAD (default: false)
    pub use_get: bool,

    /// Interval between probes (default: 5s)
    pub interval: Duration,

    /// Probe timeout (default: 5s)
    pub timeout: Duration,
}

/// Homepage entry of a route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomepageItem {
    /// Show the route on the homepage (default: true)
    pub show: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Position within its category (default: 0)
    pub sort_order: i64,

    /// Free-form widget settings, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_config: Option<RawNode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Top-level homepage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomepageSettings {
    /// Group routes into built-in categories (default: true)
    pub use_default_categories: bool,
}

/// Access log configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessLog {
    /// Write buffer size in bytes (default: 65536)
    pub buffer_size: u64,

    /// Line format (default: combined)
    pub format: AccessLogFormat,

    /// Log file path
    pub path: String,

    #[serde(skip_serializing_if = "AccessLogFilters::is_empty")]
    pub filters: AccessLogFilters,

    #[serde(skip_serializing_if = "AccessLogFields::is_empty")]
    pub fields: AccessLogFields,
}

/// One access log filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFilter<T> {
    /// Invert the match (default: false)
    #[serde(skip_serializing_if = "is_false")]
    pub negative: bool,

    pub values: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessLogFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_codes: Option<LogFilter<StatusCodeRange>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<LogFilter<HttpMethod>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<LogFilter<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<LogFilter<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<LogFilter<Cidr>>,
}

impl AccessLogFilters {
    pub fn is_empty(&self) -> bool {
        self.status_codes.is_none()
            && self.method.is_none()
            && self.host.is_none()
            && self.headers.is_none()
            && self.cidr.is_none()
    }
}

/// Redaction policy for one class of request fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPolicy {
    /// Mode for names not listed in `config` (default: keep)
    pub default: FieldMode,

    pub config: BTreeMap<String, FieldMode>,
}

impl FieldPolicy {
    pub fn mode_for(&self, name: &str) -> FieldMode {
        self.config.get(name).copied().unwrap_or(self.default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessLogFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<FieldPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<FieldPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<FieldPolicy>,
}

impl AccessLogFields {
    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.query.is_none() && self.cookie.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_policy_mode_for() {
        let policy = FieldPolicy {
            default: FieldMode::Keep,
            config: BTreeMap::from([("Authorization".to_string(), FieldMode::Redact)]),
        };
        assert_eq!(policy.mode_for("Authorization"), FieldMode::Redact);
        assert_eq!(policy.mode_for("Accept"), FieldMode::Keep);
    }

    #[test]
    fn test_access_log_serializes_without_empty_sections() {
        let log = AccessLog {
            buffer_size: 65536,
            format: AccessLogFormat::Combined,
            path: "/var/log/access.log".to_string(),
            filters: AccessLogFilters::default(),
            fields: AccessLogFields::default(),
        };
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "buffer_size": 65536,
                "format": "combined",
                "path": "/var/log/access.log"
            })
        );
    }
}
