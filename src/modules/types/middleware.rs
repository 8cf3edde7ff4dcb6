//! Middleware identities and `<name>@file` indirections

use std::fmt;

use crate::alias::{construct, UnknownAlias};

/// Suffix marking a middleware entry that refers to a compose file chain
pub const FILE_REF_SUFFIX: &str = "@file";

construct! {
    /// Canonical middleware identity
    pub enum MiddlewareKind in "middleware" {
        ErrorPage => "error_page" | "errorPage" | "ErrorPage"
            | "custom_error_page" | "customErrorPage" | "CustomErrorPage",
        RedirectHttp => "redirect_http" | "redirectHTTP" | "RedirectHTTP",
        SetXForwarded => "set_x_forwarded" | "setXForwarded" | "SetXForwarded",
        HideXForwarded => "hide_x_forwarded" | "hideXForwarded" | "HideXForwarded",
        CidrWhitelist => "cidr_whitelist" | "cidrWhitelist" | "CIDRWhitelist",
        CloudflareRealIp => "cloudflare_real_ip" | "cloudflareRealIp" | "cloudflareRealIP"
            | "CloudflareRealIP",
        ModifyRequest => "modify_request" | "modifyRequest" | "ModifyRequest"
            | "request" | "Request",
        ModifyResponse => "modify_response" | "modifyResponse" | "ModifyResponse"
            | "response" | "Response",
        Oidc => "oidc" | "OIDC",
        RateLimit => "rate_limit" | "rateLimit" | "RateLimit",
        RealIp => "real_ip" | "realIP" | "RealIP",
    }
}

impl MiddlewareKind {
    /// Whether this identity may appear more than once in one chain
    pub fn allows_repeat(&self) -> bool {
        matches!(self, MiddlewareKind::ModifyRequest | MiddlewareKind::ModifyResponse)
    }
}

/// A middleware name as written in a chain: either a concrete identity or a
/// reference to a chain defined in a middleware compose file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MiddlewareName {
    Builtin(MiddlewareKind),
    FileRef(String),
}

impl MiddlewareName {
    pub fn parse(raw: &str) -> Result<Self, UnknownAlias> {
        match raw.strip_suffix(FILE_REF_SUFFIX) {
            Some(name) if !name.is_empty() => Ok(MiddlewareName::FileRef(name.to_string())),
            _ => MiddlewareKind::ALIASES.resolve(raw).map(MiddlewareName::Builtin),
        }
    }
}

impl fmt::Display for MiddlewareName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareName::Builtin(kind) => write!(f, "{}", kind),
            MiddlewareName::FileRef(name) => write!(f, "{}{}", name, FILE_REF_SUFFIX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_spellings_resolve_to_one_identity() {
        for kind in MiddlewareKind::all() {
            for spelling in MiddlewareKind::ALIASES.spellings_of(*kind) {
                assert_eq!(MiddlewareKind::ALIASES.resolve(spelling), Ok(*kind));
            }
        }
        assert_eq!(
            MiddlewareKind::ALIASES.spellings_of(MiddlewareKind::RateLimit),
            vec!["rate_limit", "rateLimit", "RateLimit"]
        );
    }

    #[test]
    fn test_cloudflare_real_ip_spellings() {
        for spelling in ["cloudflare_real_ip", "cloudflareRealIp", "cloudflareRealIP", "CloudflareRealIP"] {
            assert_eq!(
                MiddlewareName::parse(spelling).unwrap(),
                MiddlewareName::Builtin(MiddlewareKind::CloudflareRealIp)
            );
        }
    }

    #[test]
    fn test_unknown_middleware_lists_accepted() {
        let err = MiddlewareName::parse("ratelimit").unwrap_err();
        assert_eq!(err.class, "middleware");
        assert!(err.accepted.contains(&"RateLimit"));
        assert_eq!(err.suggestion, Some("rate_limit"));
    }

    #[test]
    fn test_file_ref() {
        assert_eq!(
            MiddlewareName::parse("auth@file").unwrap(),
            MiddlewareName::FileRef("auth".to_string())
        );
        assert!(MiddlewareName::parse("@file").is_err());
        assert_eq!(MiddlewareName::parse("auth@file").unwrap().to_string(), "auth@file");
    }

    #[test]
    fn test_repeat_policy() {
        assert!(MiddlewareKind::ModifyRequest.allows_repeat());
        assert!(!MiddlewareKind::CidrWhitelist.allows_repeat());
    }
}
