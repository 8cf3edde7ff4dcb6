//! Middleware chains and their per-identity option records

use portico_types::{Cidr, Duration, MiddlewareKind, StatusCode};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::path::FieldPath;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitOptions {
    /// Requests allowed per period (>= 1)
    pub average: u64,
    /// Burst size (>= 1)
    pub burst: u64,
    /// Period length (default: 1s)
    pub period: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CidrWhitelistOptions {
    pub allow: Vec<Cidr>,
    /// Status returned to blocked clients (default: 403)
    pub status: StatusCode,
    /// Body returned to blocked clients (default: "IP not allowed")
    pub message: String,
}

/// Real client IP extraction, shared by the RealIP middleware and ip_hash load balancing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealIpOptions {
    /// Header carrying the client address (default: X-Real-IP)
    pub header: String,
    /// Trusted upstream networks
    pub from: Vec<Cidr>,
    /// Resolve recursively through trusted hops (default: false)
    #[serde(skip_serializing_if = "is_false")]
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudflareRealIpOptions {
    #[serde(skip_serializing_if = "is_false")]
    pub recursive: bool,
}

/// Header edits applied by ModifyRequest / ModifyResponse
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModifyHeadersOptions {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub add_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hide_headers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OidcOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_groups: Option<Vec<String>>,
}

/// Validated option record of one middleware invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareOptions {
    None,
    RateLimit(RateLimitOptions),
    CidrWhitelist(CidrWhitelistOptions),
    RealIp(RealIpOptions),
    CloudflareRealIp(CloudflareRealIpOptions),
    ModifyHeaders(ModifyHeadersOptions),
    Oidc(OidcOptions),
}

/// One entry of a canonical middleware chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Middleware {
    pub kind: MiddlewareKind,
    pub options: MiddlewareOptions,
}

impl Middleware {
    pub fn new(kind: MiddlewareKind, options: MiddlewareOptions) -> Self {
        Self { kind, options }
    }
}

impl Serialize for Middleware {
    /// Entrypoint form: `{use: <canonical name>, ...options}`
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a, T> {
            #[serde(rename = "use")]
            kind: MiddlewareKind,
            #[serde(flatten)]
            options: &'a T,
        }

        let kind = self.kind;
        match &self.options {
            MiddlewareOptions::None => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("use", &kind)?;
                map.end()
            }
            MiddlewareOptions::RateLimit(options) => Entry { kind, options }.serialize(serializer),
            MiddlewareOptions::CidrWhitelist(options) => {
                Entry { kind, options }.serialize(serializer)
            }
            MiddlewareOptions::RealIp(options) => Entry { kind, options }.serialize(serializer),
            MiddlewareOptions::CloudflareRealIp(options) => {
                Entry { kind, options }.serialize(serializer)
            }
            MiddlewareOptions::ModifyHeaders(options) => {
                Entry { kind, options }.serialize(serializer)
            }
            MiddlewareOptions::Oidc(options) => Entry { kind, options }.serialize(serializer),
        }
    }
}

/// Ordered, fully resolved middleware chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MiddlewareChain(Vec<Middleware>);

impl MiddlewareChain {
    pub fn new(entries: Vec<Middleware>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Middleware> {
        self.0.iter()
    }

    pub fn get(&self, kind: MiddlewareKind) -> Option<&Middleware> {
        self.0.iter().find(|m| m.kind == kind)
    }

    pub fn contains(&self, kind: MiddlewareKind) -> bool {
        self.get(kind).is_some()
    }
}

/// A chain slot before reference resolution.
///
/// `Unresolved` marks a `<name>@file` indirection; a chain holding one is not
/// canonical until every marker has been replaced by decoded entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSlot {
    Resolved {
        path: FieldPath,
        middleware: Middleware,
    },
    Unresolved {
        path: FieldPath,
        name: String,
    },
}

impl ChainSlot {
    pub fn path(&self) -> &FieldPath {
        match self {
            ChainSlot::Resolved { path, .. } | ChainSlot::Unresolved { path, .. } => path,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ChainSlot::Resolved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_entry_form() {
        let chain = MiddlewareChain::new(vec![
            Middleware::new(MiddlewareKind::RedirectHttp, MiddlewareOptions::None),
            Middleware::new(
                MiddlewareKind::CidrWhitelist,
                MiddlewareOptions::CidrWhitelist(CidrWhitelistOptions {
                    allow: vec![Cidr::parse("10.0.0.0/8").unwrap()],
                    status: StatusCode::FORBIDDEN,
                    message: "IP not allowed".to_string(),
                }),
            ),
        ]);
        assert_eq!(
            serde_json::to_value(&chain).unwrap(),
            json!([
                {"use": "redirect_http"},
                {"use": "cidr_whitelist", "allow": ["10.0.0.0/8"], "status": 403, "message": "IP not allowed"}
            ])
        );
    }

    #[test]
    fn test_chain_lookup() {
        let chain = MiddlewareChain::new(vec![Middleware::new(
            MiddlewareKind::Oidc,
            MiddlewareOptions::Oidc(OidcOptions::default()),
        )]);
        assert!(chain.contains(MiddlewareKind::Oidc));
        assert!(!chain.contains(MiddlewareKind::RateLimit));
        assert_eq!(chain.len(), 1);
    }
}
