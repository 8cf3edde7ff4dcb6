//! Middleware chain decoding and `<name>@file` resolution
//!
//! A chain is decoded in two steps. [`decode_slots`] turns either chain shape
//! into [`ChainSlot`]s, leaving `@file` indirections unresolved. [`resolve_chain`]
//! then expands every indirection through the [`ReferenceSource`] and checks
//! that no identity repeats unless it is allowed to.

use portico_core::{
    ChainSlot, CidrWhitelistOptions, CloudflareRealIpOptions, ConfigError, ConfigErrors,
    ErrorKind, FieldPath, Middleware, MiddlewareChain, MiddlewareOptions, ModifyHeadersOptions, OidcOptions,
    RateLimitOptions, RawNode, RealIpOptions,
};
use portico_types::{Kind, MiddlewareKind, MiddlewareName, FILE_REF_SUFFIX};
use std::collections::HashMap;
use tracing::debug;

use crate::defaults;
use crate::record::Record;
use crate::reference::ReferenceSource;
use crate::scalar::{
    bounded, boolean, cidr, duration, kind, list, non_empty_list, non_empty_string, status_code,
    string, string_map,
};

/// Decode and resolve a middleware chain in either shape
pub(crate) fn decode_chain(
    source: &dyn ReferenceSource,
    path: &FieldPath,
    node: &RawNode,
) -> Result<MiddlewareChain, ConfigErrors> {
    let mut errors = ConfigErrors::new();
    let slots = errors.absorb(decode_slots(path, node)).unwrap_or_default();
    let chain = errors.absorb(resolve_chain(source, slots));
    match chain {
        Some(chain) if errors.is_empty() => Ok(chain),
        _ => Err(errors),
    }
}

/// Decode a chain into slots: `[{use: name, ...}]` or `{name: options|null}`
pub(crate) fn decode_slots(path: &FieldPath, node: &RawNode) -> Result<Vec<ChainSlot>, ConfigErrors> {
    let mut errors = ConfigErrors::new();
    let mut slots = Vec::new();

    match node {
        RawNode::Null => {}
        RawNode::Seq(items) => {
            for (i, item) in items.iter().enumerate() {
                if let Some(slot) = errors.absorb(list_entry(&path.index(i), item)) {
                    slots.push(slot);
                }
            }
        }
        RawNode::Map(entries) => {
            for (name, options) in entries {
                if let Some(slot) = errors.absorb(map_entry(&path.key(name.as_str()), name, options)) {
                    slots.push(slot);
                }
            }
        }
        other => {
            errors.push(ConfigError::wrong_type(
                path.clone(),
                "a middleware list or mapping",
                other.type_name(),
            ));
        }
    }

    errors.into_result(slots)
}

fn list_entry(path: &FieldPath, node: &RawNode) -> Result<ChainSlot, ConfigErrors> {
    let mut rec = Record::new(node, path, "middleware entry")?;
    let Some(name) = rec.required("use", |path, node| {
        let raw = string(path, node)?;
        MiddlewareName::parse(&raw).map_err(|e| ConfigError::unknown_construct(path.clone(), &e).into())
    }) else {
        return Err(rec.abort(ConfigErrors::new()));
    };

    match name {
        MiddlewareName::FileRef(name) => rec.build(|| {
            Some(ChainSlot::Unresolved {
                path: path.clone(),
                name,
            })
        }),
        MiddlewareName::Builtin(kind) => {
            let mut rec = rec.renamed(kind.as_str());
            let options = decode_options(kind, &mut rec);
            rec.build(|| {
                Some(ChainSlot::Resolved {
                    path: path.clone(),
                    middleware: Middleware::new(kind, options?),
                })
            })
        }
    }
}

fn map_entry(path: &FieldPath, name: &str, node: &RawNode) -> Result<ChainSlot, ConfigErrors> {
    let name = MiddlewareName::parse(name)
        .map_err(|e| ConfigErrors::from(ConfigError::unknown_construct(path.clone(), &e)))?;

    match name {
        MiddlewareName::FileRef(name) => {
            if !node.is_null() {
                return Err(ConfigError::new(
                    path.clone(),
                    ErrorKind::PatternMismatch,
                    format!("'{}{}' takes no options", name, FILE_REF_SUFFIX),
                )
                .into());
            }
            Ok(ChainSlot::Unresolved {
                path: path.clone(),
                name,
            })
        }
        MiddlewareName::Builtin(kind) => {
            let mut rec = Record::new_or_empty(node, path, kind.as_str())?;
            let options = decode_options(kind, &mut rec);
            rec.build(|| {
                Some(ChainSlot::Resolved {
                    path: path.clone(),
                    middleware: Middleware::new(kind, options?),
                })
            })
        }
    }
}

/// Replace every unresolved slot by the chain it names, then check repeats
pub(crate) fn resolve_chain(
    source: &dyn ReferenceSource,
    slots: Vec<ChainSlot>,
) -> Result<MiddlewareChain, ConfigErrors> {
    let mut errors = ConfigErrors::new();
    let mut resolved: Vec<(FieldPath, Middleware)> = Vec::with_capacity(slots.len());

    for slot in slots {
        match slot {
            ChainSlot::Resolved { path, middleware } => resolved.push((path, middleware)),
            ChainSlot::Unresolved { path, name } => match expand(source, &path, &name) {
                Ok(entries) => resolved.extend(entries),
                Err(e) => errors.extend(e),
            },
        }
    }

    let mut seen: HashMap<MiddlewareKind, FieldPath> = HashMap::new();
    for (path, middleware) in &resolved {
        if middleware.kind.allows_repeat() {
            continue;
        }
        if let Some(first) = seen.get(&middleware.kind) {
            errors.push(ConfigError::invariant(
                path.clone(),
                format!("middleware '{}' is already used at {}", middleware.kind, first),
            ));
        } else {
            seen.insert(middleware.kind, path.clone());
        }
    }

    errors.into_result(MiddlewareChain::new(
        resolved.into_iter().map(|(_, middleware)| middleware).collect(),
    ))
}

fn expand(
    source: &dyn ReferenceSource,
    path: &FieldPath,
    name: &str,
) -> Result<Vec<(FieldPath, Middleware)>, ConfigErrors> {
    let chain = source.middleware_chain(name).map_err(|e| {
        ConfigErrors::from(ConfigError::unresolved(
            path.clone(),
            format!("middleware reference {}", e),
        ))
    })?;
    debug!("Resolved middleware reference '{}@file' at {}", name, path);

    let mut errors = ConfigErrors::new();
    let mut entries = Vec::new();
    for slot in decode_slots(path, &chain)? {
        match slot {
            ChainSlot::Resolved { path, middleware } => entries.push((path, middleware)),
            ChainSlot::Unresolved { path, name: nested } => errors.push(ConfigError::unresolved(
                path,
                format!("'{}@file' cannot be referenced from inside '{}@file'", nested, name),
            )),
        }
    }
    errors.into_result(entries)
}

/// Decode the option record of one middleware identity from `rec`
fn decode_options(identity: MiddlewareKind, rec: &mut Record<'_>) -> Option<MiddlewareOptions> {
    match identity {
        MiddlewareKind::ErrorPage
        | MiddlewareKind::RedirectHttp
        | MiddlewareKind::SetXForwarded
        | MiddlewareKind::HideXForwarded => Some(MiddlewareOptions::None),
        MiddlewareKind::RateLimit => {
            let average = rec.required("average", bounded(1, i64::MAX));
            let burst = rec.required("burst", bounded(1, i64::MAX));
            let period = rec.optional("period", duration);
            Some(MiddlewareOptions::RateLimit(RateLimitOptions {
                average: average? as u64,
                burst: burst? as u64,
                period: period.unwrap_or(defaults::RATE_LIMIT_PERIOD),
            }))
        }
        MiddlewareKind::CidrWhitelist => {
            let allow = rec.required("allow", list(cidr));
            let status = rec.optional_any(&["status", "status_code"], |path, node| {
                let code = status_code(path, node)?;
                if !(400..=599).contains(&code.get()) {
                    return Err(ConfigError::range(
                        path.clone(),
                        format!("{} is out of range: expected 400 to 599", code),
                    )
                    .into());
                }
                Ok(code)
            });
            let message = rec.optional("message", string);
            Some(MiddlewareOptions::CidrWhitelist(CidrWhitelistOptions {
                allow: allow?,
                status: status.unwrap_or(defaults::CIDR_WHITELIST_STATUS),
                message: message.unwrap_or_else(|| defaults::CIDR_WHITELIST_MESSAGE.to_string()),
            }))
        }
        MiddlewareKind::RealIp => real_ip(rec, true).map(MiddlewareOptions::RealIp),
        MiddlewareKind::CloudflareRealIp => {
            let recursive = rec.optional("recursive", boolean);
            Some(MiddlewareOptions::CloudflareRealIp(CloudflareRealIpOptions {
                recursive: recursive.unwrap_or(false),
            }))
        }
        MiddlewareKind::ModifyRequest | MiddlewareKind::ModifyResponse => {
            let set_headers = rec.optional("set_headers", string_map(Some(Kind::HttpHeader), string));
            let add_headers = rec.optional("add_headers", string_map(Some(Kind::HttpHeader), string));
            let hide_headers = rec.optional("hide_headers", list(kind(Kind::HttpHeader)));
            Some(MiddlewareOptions::ModifyHeaders(ModifyHeadersOptions {
                set_headers: set_headers.unwrap_or_default(),
                add_headers: add_headers.unwrap_or_default(),
                hide_headers: hide_headers.unwrap_or_default(),
            }))
        }
        MiddlewareKind::Oidc => {
            let allowed_users = rec.optional("allowed_users", non_empty_list(non_empty_string));
            let allowed_groups = rec.optional("allowed_groups", non_empty_list(non_empty_string));
            Some(MiddlewareOptions::Oidc(OidcOptions {
                allowed_users,
                allowed_groups,
            }))
        }
    }
}

/// RealIP option record; `from` is optional when nested under ip_hash load balancing
pub(crate) fn real_ip(rec: &mut Record<'_>, from_required: bool) -> Option<RealIpOptions> {
    let header = rec.optional("header", kind(Kind::HttpHeader));
    let from = if from_required {
        rec.required("from", list(cidr))
    } else {
        rec.optional("from", list(cidr)).or_else(|| Some(Vec::new()))
    };
    let recursive = rec.optional("recursive", boolean);
    Some(RealIpOptions {
        header: header.unwrap_or_else(|| defaults::REAL_IP_HEADER.to_string()),
        from: from?,
        recursive: recursive.unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, DocumentParser};
    use crate::reference::MemorySource;
    use portico_types::StatusCode;

    fn yaml(text: &str) -> RawNode {
        DocumentParser::parse("test.yml", text, DocumentFormat::Yaml).unwrap()
    }

    fn chain(text: &str) -> Result<MiddlewareChain, ConfigErrors> {
        decode_chain(&MemorySource::new(), &FieldPath::of("middlewares"), &yaml(text))
    }

    #[test]
    fn test_cidr_whitelist_defaults() {
        let chain = chain("- use: CIDRWhitelist\n  allow: [10.0.0.0/8]\n").unwrap();
        let entry = chain.get(MiddlewareKind::CidrWhitelist).unwrap();
        match &entry.options {
            MiddlewareOptions::CidrWhitelist(options) => {
                assert_eq!(options.status, StatusCode::FORBIDDEN);
                assert_eq!(options.message, "IP not allowed");
                assert_eq!(options.allow.len(), 1);
            }
            other => panic!("unexpected options: {:?}", other),
        }
    }

    #[test]
    fn test_spellings_decode_identically() {
        let a = chain("- use: rate_limit\n  average: 10\n  burst: 20\n").unwrap();
        let b = chain("- use: rateLimit\n  average: 10\n  burst: 20\n").unwrap();
        let c = chain("RateLimit:\n  average: 10\n  burst: 20\n").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_map_form_with_null_options() {
        let chain = chain("redirectHTTP:\nsetXForwarded: {}\n").unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.contains(MiddlewareKind::RedirectHttp));
    }

    #[test]
    fn test_optionless_middleware_rejects_options() {
        let errors = chain("- use: hide_x_forwarded
  header: X-Real-IP
").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.count(ErrorKind::UnexpectedField), 1);
    }

    #[test]
    fn test_cloudflare_real_ip_map_form() {
        let chain = chain("cloudflareRealIp:
").unwrap();
        let entry = chain.get(MiddlewareKind::CloudflareRealIp).unwrap();
        assert_eq!(
            entry.options,
            MiddlewareOptions::CloudflareRealIp(CloudflareRealIpOptions { recursive: false })
        );
    }

    #[test]
    fn test_unknown_name_lists_accepted_spellings() {
        let errors = chain("- use: ratelimit\n").unwrap_err();
        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().unwrap();
        assert_eq!(error.kind, ErrorKind::UnknownConstruct);
        assert_eq!(error.path.to_string(), "middlewares[0].use");
        assert!(error.message.contains("rateLimit"));
    }

    #[test]
    fn test_errors_from_every_entry_are_collected() {
        let errors = chain(
            "- use: CIDRWhitelist\n  allow: [bogus]\n  status: 200\n- use: RateLimit\n  average: 0\n  burst: 1\n  perod: 1s\n",
        )
        .unwrap_err();
        let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "middlewares[0].allow[0]",
                "middlewares[0].status",
                "middlewares[1].average",
                "middlewares[1].perod",
            ]
        );
    }

    #[test]
    fn test_repeat_rules() {
        let errors = chain("- use: oidc\n- use: OIDC\n").unwrap_err();
        assert_eq!(errors.count(ErrorKind::InvariantViolation), 1);
        assert_eq!(errors.iter().next().unwrap().path.to_string(), "middlewares[1]");

        let ok = chain("- use: request\n  set_headers: {X-A: a}\n- use: modifyRequest\n  hide_headers: [X-B]\n");
        assert_eq!(ok.unwrap().len(), 2);
    }

    #[test]
    fn test_file_reference_expands_in_place() {
        let source = MemorySource::new().with_chain(
            "secure",
            yaml("- use: RealIP\n  from: [10.0.0.0/8]\n- use: redirectHTTP\n"),
        );
        let node = yaml("- use: hideXForwarded\n- use: secure@file\n");
        let chain = decode_chain(&source, &FieldPath::of("m"), &node).unwrap();
        let kinds: Vec<MiddlewareKind> = chain.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![MiddlewareKind::HideXForwarded, MiddlewareKind::RealIp, MiddlewareKind::RedirectHttp]
        );
    }

    #[test]
    fn test_missing_file_reference_is_attributed_to_slot() {
        let node = yaml("- use: redirectHTTP\n- use: missing@file\n");
        let errors = decode_chain(&MemorySource::new(), &FieldPath::of("m"), &node).unwrap_err();
        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().unwrap();
        assert_eq!(error.kind, ErrorKind::UnresolvedReference);
        assert_eq!(error.path.to_string(), "m[1]");
    }

    #[test]
    fn test_nested_file_reference_rejected() {
        let source = MemorySource::new()
            .with_chain("outer", yaml("- use: inner@file\n"))
            .with_chain("inner", yaml("- use: redirectHTTP\n"));
        let node = yaml("outer@file:\n");
        let errors = decode_chain(&source, &FieldPath::of("m"), &node).unwrap_err();
        assert_eq!(errors.count(ErrorKind::UnresolvedReference), 1);
    }
}
