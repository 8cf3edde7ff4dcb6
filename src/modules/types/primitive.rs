//! Primitive validators for scalar configuration values
//!
//! Every validator is a pure function of its input. Pattern-only kinds are
//! checked by [`validate`]; kinds with a structured value (durations, CIDRs,
//! ports, status codes) also have a typed parser in their own module.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use thiserror::Error;

use crate::duration::Duration;
use crate::net::{Cidr, Port, StreamPort};
use crate::status::{StatusCode, StatusCodeRange};

static HOSTNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

static DOMAIN_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9][a-z0-9-]{0,61}[a-z0-9]$")
        .unwrap()
});

static DOMAIN_OR_WILDCARD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\*\.)?(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9][a-z0-9-]{0,61}[a-z0-9]$",
    )
    .unwrap()
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .unwrap()
});

static PATH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:([A-Z]+) )?([a-zA-Z0-9.-]+)?(/[^\s]*)$").unwrap());

static HTTP_HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-]+$").unwrap());

static HTTP_TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-_]+$").unwrap());

static INCLUDE_FILE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w\-]+\.(yaml|yml)$").unwrap());

static DOCKER_HOST_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+://\S+$").unwrap());

/// Scalar kinds understood by the validators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Duration,
    Cidr,
    Hostname,
    Ipv4,
    Ipv6,
    Port,
    Email,
    Url,
    Uri,
    PathPattern,
    StatusCode,
    StatusCodeRange,
    StreamPort,
    DomainName,
    DomainOrWildcard,
    HttpHeader,
    HttpQuery,
    HttpCookie,
    IncludeFile,
    DockerHost,
    AgentAddress,
}

impl Kind {
    /// Description of what a value of this kind must look like
    pub fn expected(&self) -> &'static str {
        match self {
            Kind::Duration => "one or more <integer><unit> pairs, unit one of ms|s|m|h",
            Kind::Cidr => "an IPv4/IPv6 address or address/prefix",
            Kind::Hostname => "an RFC 1123 hostname",
            Kind::Ipv4 => "an IPv4 address",
            Kind::Ipv6 => "an IPv6 address",
            Kind::Port => "an integer between 0 and 65535",
            Kind::Email => "an email address",
            Kind::Url => "an absolute URL",
            Kind::Uri => "a URI reference",
            Kind::PathPattern => "[METHOD ][host]/path",
            Kind::StatusCode => "an HTTP status code between 100 and 599",
            Kind::StatusCodeRange => "a status code or <low>-<high> with low <= high",
            Kind::StreamPort => "[listening_port:]target_port",
            Kind::DomainName => "a lowercase domain name",
            Kind::DomainOrWildcard => "a lowercase domain name, optionally prefixed by '*.'",
            Kind::HttpHeader => "an HTTP header name ([a-zA-Z0-9-]+)",
            Kind::HttpQuery => "a query parameter name ([a-zA-Z0-9-_]+)",
            Kind::HttpCookie => "a cookie name ([a-zA-Z0-9-_]+)",
            Kind::IncludeFile => "a file name ending in .yml or .yaml",
            Kind::DockerHost => "a docker host URL (<scheme>://...)",
            Kind::AgentAddress => "host:port",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Duration => "duration",
            Kind::Cidr => "CIDR",
            Kind::Hostname => "hostname",
            Kind::Ipv4 => "IPv4 address",
            Kind::Ipv6 => "IPv6 address",
            Kind::Port => "port",
            Kind::Email => "email",
            Kind::Url => "URL",
            Kind::Uri => "URI",
            Kind::PathPattern => "path pattern",
            Kind::StatusCode => "status code",
            Kind::StatusCodeRange => "status code range",
            Kind::StreamPort => "stream port",
            Kind::DomainName => "domain name",
            Kind::DomainOrWildcard => "domain",
            Kind::HttpHeader => "header name",
            Kind::HttpQuery => "query name",
            Kind::HttpCookie => "cookie name",
            Kind::IncludeFile => "include file",
            Kind::DockerHost => "docker host",
            Kind::AgentAddress => "agent address",
        };
        f.write_str(name)
    }
}

/// A scalar that failed its kind's rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    #[error("invalid {kind} '{value}': expected {}", .kind.expected())]
    Pattern { kind: Kind, value: String },

    #[error("{kind} '{value}' is out of range: expected {}", .kind.expected())]
    Range { kind: Kind, value: String },
}

impl PrimitiveError {
    pub fn pattern(kind: Kind, value: impl Into<String>) -> Self {
        PrimitiveError::Pattern {
            kind,
            value: value.into(),
        }
    }

    pub fn range(kind: Kind, value: impl Into<String>) -> Self {
        PrimitiveError::Range {
            kind,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            PrimitiveError::Pattern { kind, .. } | PrimitiveError::Range { kind, .. } => *kind,
        }
    }
}

/// A validated scalar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated {
    Text(String),
    Duration(Duration),
    Cidr(Cidr),
    Port(Port),
    StreamPort(StreamPort),
    StatusCode(StatusCode),
    StatusCodeRange(StatusCodeRange),
}

/// Validate a raw scalar (in its textual form) against `kind`
pub fn validate(kind: Kind, raw: &str) -> Result<Validated, PrimitiveError> {
    let ok = match kind {
        Kind::Duration => return Duration::parse(raw).map(Validated::Duration),
        Kind::Cidr => return Cidr::parse(raw).map(Validated::Cidr),
        Kind::Port => return Port::parse(raw).map(Validated::Port),
        Kind::StreamPort => return StreamPort::parse(raw).map(Validated::StreamPort),
        Kind::StatusCode => return StatusCode::parse(raw).map(Validated::StatusCode),
        Kind::StatusCodeRange => {
            return StatusCodeRange::parse(raw).map(Validated::StatusCodeRange)
        }
        Kind::Hostname => is_hostname(raw),
        Kind::Ipv4 => raw.parse::<Ipv4Addr>().is_ok(),
        Kind::Ipv6 => raw.parse::<Ipv6Addr>().is_ok(),
        Kind::Email => EMAIL_PATTERN.is_match(raw),
        Kind::Url => is_absolute_url(raw),
        Kind::Uri => is_uri_reference(raw),
        Kind::PathPattern => PATH_PATTERN.is_match(raw),
        Kind::DomainName => DOMAIN_NAME_PATTERN.is_match(raw),
        Kind::DomainOrWildcard => DOMAIN_OR_WILDCARD_PATTERN.is_match(raw),
        Kind::HttpHeader => HTTP_HEADER_PATTERN.is_match(raw),
        Kind::HttpQuery | Kind::HttpCookie => HTTP_TOKEN_PATTERN.is_match(raw),
        Kind::IncludeFile => INCLUDE_FILE_PATTERN.is_match(raw),
        Kind::DockerHost => DOCKER_HOST_PATTERN.is_match(raw),
        Kind::AgentAddress => return validate_agent_address(raw),
    };

    if ok {
        Ok(Validated::Text(raw.to_string()))
    } else {
        Err(PrimitiveError::pattern(kind, raw))
    }
}

/// Validate a pattern-only kind and hand back the text
pub fn validate_text(kind: Kind, raw: &str) -> Result<String, PrimitiveError> {
    match validate(kind, raw)? {
        Validated::Text(text) => Ok(text),
        _ => Ok(raw.to_string()),
    }
}

/// Hostname, IPv4 or IPv6 address
pub fn is_host(raw: &str) -> bool {
    is_hostname(raw) || raw.parse::<Ipv4Addr>().is_ok() || raw.parse::<Ipv6Addr>().is_ok()
}

fn is_hostname(raw: &str) -> bool {
    raw.len() <= 253 && HOSTNAME_PATTERN.is_match(raw)
}

fn is_absolute_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok()
}

fn is_uri_reference(raw: &str) -> bool {
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return false;
    }
    url::Url::parse(raw).is_ok()
        || url::Url::parse("file:///")
            .and_then(|base| base.join(raw))
            .is_ok()
}

fn validate_agent_address(raw: &str) -> Result<Validated, PrimitiveError> {
    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| PrimitiveError::pattern(Kind::AgentAddress, raw))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if !is_host(host) {
        return Err(PrimitiveError::pattern(Kind::AgentAddress, raw));
    }
    Port::parse(port).map_err(|e| match e {
        PrimitiveError::Range { .. } => PrimitiveError::range(Kind::AgentAddress, raw),
        PrimitiveError::Pattern { .. } => PrimitiveError::pattern(Kind::AgentAddress, raw),
    })?;
    Ok(Validated::Text(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_and_ips() {
        assert!(validate(Kind::Hostname, "localhost").is_ok());
        assert!(validate(Kind::Hostname, "app.example.com").is_ok());
        assert!(validate(Kind::Hostname, "-bad.example.com").is_err());
        assert!(validate(Kind::Ipv4, "10.0.0.1").is_ok());
        assert!(validate(Kind::Ipv6, "::1").is_ok());
        assert!(is_host("::1"));
        assert!(is_host("10.0.2.1"));
        assert!(!is_host("not a host"));
    }

    #[test]
    fn test_email() {
        assert!(validate(Kind::Email, "admin@example.com").is_ok());
        assert!(validate(Kind::Email, "abc@gmail").is_ok());
        assert!(validate(Kind::Email, "not-an-email").is_err());
    }

    #[test]
    fn test_domains() {
        assert!(validate(Kind::DomainName, "example.com").is_ok());
        assert!(validate(Kind::DomainName, "*.example.com").is_err());
        assert!(validate(Kind::DomainOrWildcard, "*.example.com").is_ok());
        assert!(validate(Kind::DomainOrWildcard, "Example.com").is_err());
    }

    #[test]
    fn test_path_pattern() {
        assert!(validate(Kind::PathPattern, "/").is_ok());
        assert!(validate(Kind::PathPattern, "/api/{$}").is_ok());
        assert!(validate(Kind::PathPattern, "GET /api").is_ok());
        assert!(validate(Kind::PathPattern, "POST example.com/upload").is_ok());
        assert!(validate(Kind::PathPattern, "api").is_err());
        assert!(validate(Kind::PathPattern, "get /api").is_err());
    }

    #[test]
    fn test_header_query_cookie_names() {
        assert!(validate(Kind::HttpHeader, "X-Real-IP").is_ok());
        assert!(validate(Kind::HttpHeader, "X_Real_IP").is_err());
        assert!(validate(Kind::HttpQuery, "session_id").is_ok());
        assert!(validate(Kind::HttpCookie, "bad cookie").is_err());
    }

    #[test]
    fn test_urls() {
        assert!(validate(Kind::Url, "https://gotify.domain.tld").is_ok());
        assert!(validate(Kind::Url, "gotify.domain.tld").is_err());
        assert!(validate(Kind::Uri, "/var/log/access.log").is_ok());
        assert!(validate(Kind::Uri, "has space.log").is_err());
        assert!(validate(Kind::DockerHost, "tcp://10.0.2.1:2375").is_ok());
        assert!(validate(Kind::DockerHost, "unix:///var/run/docker.sock").is_ok());
        assert!(validate(Kind::DockerHost, "10.0.2.1:2375").is_err());
    }

    #[test]
    fn test_include_file() {
        assert!(validate(Kind::IncludeFile, "file1.yml").is_ok());
        assert!(validate(Kind::IncludeFile, "apps-2.yaml").is_ok());
        assert!(validate(Kind::IncludeFile, "../escape.yml").is_err());
        assert!(validate(Kind::IncludeFile, "routes.json").is_err());
    }

    #[test]
    fn test_agent_address() {
        assert!(validate(Kind::AgentAddress, "10.0.0.2:8890").is_ok());
        assert!(validate(Kind::AgentAddress, "agent.lan:8890").is_ok());
        assert!(matches!(
            validate(Kind::AgentAddress, "agent.lan:99999"),
            Err(PrimitiveError::Range { .. })
        ));
        assert!(validate(Kind::AgentAddress, "agent.lan").is_err());
    }

    #[test]
    fn test_error_message_names_kind() {
        let err = validate(Kind::Duration, "5 minutes").unwrap_err();
        assert_eq!(err.kind(), Kind::Duration);
        assert!(err.to_string().contains("invalid duration '5 minutes'"));
        assert!(err.to_string().contains("ms|s|m|h"));
    }
}
