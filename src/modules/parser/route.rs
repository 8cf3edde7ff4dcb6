//! Route decoding
//!
//! The `scheme` field selects the route variant. When it is absent the
//! variant is inferred from the port: a `listening:target` pair means a tcp
//! stream, a port ending in 443 means https, anything else http.

use portico_core::{
    ConfigError, ConfigErrors, ErrorKind, FieldPath, FileServerRoute, HealthCheck, HomepageItem,
    IdleWatcher, LoadBalance, LoadBalanceStrategy, RawNode, ReverseProxyRoute, Route, StreamRoute,
};
use portico_types::{
    is_host, validate_text, Kind, LoadBalanceMode, Port, Scheme, StopMethod, StopSignal,
};

use crate::access_log::decode_access_log;
use crate::defaults;
use crate::middleware::{decode_chain, real_ip};
use crate::record::Record;
use crate::reference::ReferenceSource;
use crate::scalar::{
    boolean, bounded, duration, identity, integer, kind, list, mapping, non_empty_string, port,
    stream_port, string,
};
use crate::validator::{forbid, FILE_SERVER_FORBIDDEN, STREAM_FORBIDDEN};

type Decoded<T> = Result<T, ConfigErrors>;

/// A decoded route before defaulting
#[derive(Debug, Clone)]
pub struct RouteDraft {
    /// Route name (key in the include file)
    pub name: String,
    /// Include file the route came from
    pub source: String,
    /// Path prefix of every error about this route
    pub path: FieldPath,
    /// Explicit alias, `None` when the route name should be used
    pub alias: Option<String>,
    pub route: Route,
}

impl RouteDraft {
    /// Fill the alias from the route name when none was given
    pub fn apply_defaults(&mut self) {
        let alias = self.alias.clone().unwrap_or_else(|| self.name.clone());
        match &mut self.route {
            Route::ReverseProxy(route) => route.alias = alias,
            Route::Stream(route) => route.alias = alias,
            Route::FileServer(route) => route.alias = alias,
        }
    }

    pub fn alias_path(&self) -> FieldPath {
        self.path.key("alias")
    }
}

/// Decode every route of one include document
pub(crate) fn decode_routes(
    source: &dyn ReferenceSource,
    file: &str,
    node: &RawNode,
) -> Result<Vec<RouteDraft>, ConfigErrors> {
    let root = FieldPath::of(file);
    let entries = match node {
        RawNode::Null => return Ok(Vec::new()),
        RawNode::Map(entries) => entries,
        other => {
            return Err(ConfigError::wrong_type(root, "a mapping of routes", other.type_name()).into())
        }
    };

    let mut errors = ConfigErrors::new();
    let mut drafts = Vec::with_capacity(entries.len());
    for (name, body) in entries {
        let path = root.key(name.as_str());
        if let Some(draft) = errors.absorb(decode_route(source, &path, body)) {
            let (alias, route) = draft;
            drafts.push(RouteDraft {
                name: name.clone(),
                source: file.to_string(),
                path,
                alias,
                route,
            });
        }
    }
    errors.into_result(drafts)
}

fn decode_route(
    source: &dyn ReferenceSource,
    path: &FieldPath,
    node: &RawNode,
) -> Decoded<(Option<String>, Route)> {
    let mut rec = Record::new_or_empty(node, path, "route")?;

    let scheme = match rec.optional("scheme", identity(&Scheme::ALIASES)) {
        Some(scheme) => scheme,
        None if rec.peek("scheme").is_some() => return Err(rec.abort(ConfigErrors::new())),
        None => infer_scheme(rec.peek("port")),
    };

    let alias = rec.optional("alias", non_empty_string);
    let mut rec = rec.renamed(format!("{} route", scheme));
    let route = match scheme {
        Scheme::Http | Scheme::Https => reverse_proxy(source, &mut rec, scheme).map(Route::ReverseProxy),
        Scheme::Tcp | Scheme::Udp => stream(&mut rec, scheme).map(Route::Stream),
        Scheme::FileServer => file_server(source, &mut rec).map(Route::FileServer),
    };
    rec.build(|| Some((alias, route?)))
}

fn infer_scheme(port: Option<&RawNode>) -> Scheme {
    let Some(text) = port.and_then(RawNode::scalar_text) else {
        return Scheme::Http;
    };
    if text.contains(':') {
        Scheme::Tcp
    } else if text.ends_with("443") {
        Scheme::Https
    } else {
        Scheme::Http
    }
}

fn host(path: &FieldPath, node: &RawNode) -> Decoded<String> {
    let raw = string(path, node)?;
    if is_host(&raw) {
        Ok(raw)
    } else {
        Err(ConfigError::new(
            path.clone(),
            ErrorKind::PatternMismatch,
            format!("'{}' is not a valid host: expected {}", raw, Kind::Hostname.expected()),
        )
        .into())
    }
}

fn reverse_proxy(
    source: &dyn ReferenceSource,
    rec: &mut Record<'_>,
    scheme: Scheme,
) -> Option<ReverseProxyRoute> {
    let host = rec.optional("host", host);
    let port = rec.optional("port", port);
    let no_tls_verify = rec.optional("no_tls_verify", boolean);
    let response_header_timeout = rec.optional("response_header_timeout", duration);
    let path_patterns = rec.optional("path_patterns", list(kind(Kind::PathPattern)));
    let healthcheck = rec.optional("healthcheck", decode_healthcheck);
    let load_balance = rec.optional("load_balance", decode_load_balance);
    let middlewares = rec.optional("middlewares", |path, node| decode_chain(source, path, node));
    let homepage = rec.optional("homepage", decode_homepage_item);
    let access_log = rec.optional("access_log", decode_access_log);
    let idle_watcher = idle_watcher(rec);

    Some(ReverseProxyRoute {
        alias: String::new(),
        scheme,
        host: host.unwrap_or_else(|| defaults::PROXY_HOST.to_string()),
        port: port.unwrap_or(Port::new(scheme.default_port())),
        no_tls_verify: no_tls_verify.unwrap_or(false),
        response_header_timeout: response_header_timeout
            .unwrap_or(defaults::RESPONSE_HEADER_TIMEOUT),
        path_patterns: path_patterns.unwrap_or_default(),
        healthcheck,
        load_balance,
        middlewares: middlewares.unwrap_or_default(),
        homepage,
        access_log,
        idle_watcher: idle_watcher?,
    })
}

fn stream(rec: &mut Record<'_>, scheme: Scheme) -> Option<StreamRoute> {
    forbid(rec, STREAM_FORBIDDEN);
    let host = rec.optional("host", host);
    let port = rec.required("port", stream_port);
    let healthcheck = rec.optional("healthcheck", decode_healthcheck);
    let idle_watcher = idle_watcher(rec);

    Some(StreamRoute {
        alias: String::new(),
        scheme,
        host: host.unwrap_or_else(|| defaults::PROXY_HOST.to_string()),
        port: port?,
        healthcheck,
        idle_watcher: idle_watcher?,
    })
}

fn file_server(source: &dyn ReferenceSource, rec: &mut Record<'_>) -> Option<FileServerRoute> {
    forbid(rec, FILE_SERVER_FORBIDDEN);
    let root = rec.required("root", non_empty_string);
    let path_patterns = rec.optional("path_patterns", list(kind(Kind::PathPattern)));
    let middlewares = rec.optional("middlewares", |path, node| decode_chain(source, path, node));
    let homepage = rec.optional("homepage", decode_homepage_item);
    let access_log = rec.optional("access_log", decode_access_log);
    let healthcheck = rec.optional("healthcheck", decode_healthcheck);

    Some(FileServerRoute {
        alias: String::new(),
        root: root?,
        path_patterns: path_patterns.unwrap_or_default(),
        middlewares: middlewares.unwrap_or_default(),
        homepage,
        access_log,
        healthcheck,
    })
}

const IDLE_FIELDS: &[&str] = &[
    "wake_timeout",
    "stop_timeout",
    "stop_method",
    "stop_signal",
    "start_endpoint",
];

/// Idle watcher fields stored flat on the route.
///
/// Returns `Some(None)` when the watcher is disabled, `None` on error.
fn idle_watcher(rec: &mut Record<'_>) -> Option<Option<IdleWatcher>> {
    if rec.peek("idle_timeout").is_none() {
        let mut ok = true;
        for &field in IDLE_FIELDS {
            if let Some((path, _)) = rec.take(field) {
                rec.push(ConfigError::invariant(
                    path,
                    format!("'{}' has no effect without idle_timeout", field),
                ));
                ok = false;
            }
        }
        return ok.then_some(None);
    }

    let idle_timeout = rec.required("idle_timeout", duration);
    let wake_timeout = rec.optional("wake_timeout", duration);
    let stop_timeout = rec.optional("stop_timeout", duration);
    let stop_method = rec.optional("stop_method", identity(&StopMethod::ALIASES));
    let stop_signal = rec.optional("stop_signal", identity(&StopSignal::ALIASES));
    let start_endpoint = rec.optional("start_endpoint", start_endpoint);

    Some(Some(IdleWatcher {
        idle_timeout: idle_timeout?,
        wake_timeout: wake_timeout.unwrap_or(defaults::WAKE_TIMEOUT),
        stop_timeout: stop_timeout.unwrap_or(defaults::STOP_TIMEOUT),
        stop_method: stop_method.unwrap_or(defaults::STOP_METHOD),
        stop_signal,
        start_endpoint,
    }))
}

/// Absolute path; any `#fragment` is dropped
fn start_endpoint(path: &FieldPath, node: &RawNode) -> Decoded<String> {
    let raw = string(path, node)?;
    let endpoint = raw.split('#').next().unwrap_or_default().to_string();
    if !endpoint.starts_with('/') {
        return Err(ConfigError::new(
            path.clone(),
            ErrorKind::PatternMismatch,
            format!("'{}' is not an absolute path", raw),
        )
        .into());
    }
    validate_text(Kind::Uri, &endpoint).map_err(|e| ConfigError::primitive(path.clone(), &e).into())
}

pub(crate) fn decode_healthcheck(path: &FieldPath, node: &RawNode) -> Decoded<HealthCheck> {
    let mut rec = Record::new_or_empty(node, path, "healthcheck")?;
    let disable = rec.optional("disable", boolean);
    let probe_path = rec.optional("path", kind(Kind::Uri));
    let use_get = rec.optional("use_get", boolean);
    let interval = rec.optional("interval", duration);
    let timeout = rec.optional("timeout", duration);

    rec.build(|| {
        Some(HealthCheck {
            disable: disable.unwrap_or(false),
            path: probe_path.unwrap_or_else(|| defaults::HEALTHCHECK_PATH.to_string()),
            use_get: use_get.unwrap_or(false),
            interval: interval.unwrap_or(defaults::HEALTHCHECK_INTERVAL),
            timeout: timeout.unwrap_or(defaults::HEALTHCHECK_TIMEOUT),
        })
    })
}

pub(crate) fn decode_homepage_item(path: &FieldPath, node: &RawNode) -> Decoded<HomepageItem> {
    let mut rec = Record::new_or_empty(node, path, "homepage item")?;
    let show = rec.optional("show", boolean);
    let name = rec.optional("name", string);
    let icon = rec.optional("icon", string);
    let category = rec.optional("category", string);
    let description = rec.optional_any(&["description", "desc"], string);
    let sort_order = rec.optional("sort_order", integer);
    let widget_config = rec.optional_any(&["widget_config", "widget"], mapping);
    let url = rec.optional("url", kind(Kind::Url));

    rec.build(|| {
        Some(HomepageItem {
            show: show.unwrap_or(defaults::HOMEPAGE_SHOW),
            name,
            icon,
            category,
            description,
            sort_order: sort_order.unwrap_or(0),
            widget_config,
            url,
        })
    })
}

pub(crate) fn decode_load_balance(path: &FieldPath, node: &RawNode) -> Decoded<LoadBalance> {
    let mut rec = Record::new(node, path, "load balance")?;
    let Some(mode) = rec.required("mode", identity(&LoadBalanceMode::ALIASES)) else {
        return Err(rec.abort(ConfigErrors::new()));
    };
    let mut rec = rec.renamed(format!("load balance mode '{}'", mode));
    let link = rec.required("link", non_empty_string);
    let weight = rec.optional("weight", bounded(0, 100));
    let strategy = match mode {
        LoadBalanceMode::RoundRobin => Some(LoadBalanceStrategy::RoundRobin),
        LoadBalanceMode::LeastConn => Some(LoadBalanceStrategy::LeastConn),
        LoadBalanceMode::IpHash => rec
            .required("config", |path, node| {
                let mut config = Record::new(node, path, "ip_hash config")?;
                let options = real_ip(&mut config, false);
                config.build(|| options)
            })
            .map(|config| LoadBalanceStrategy::IpHash { config }),
    };

    rec.build(|| {
        Some(LoadBalance {
            link: link?,
            weight: weight.map(|w| w as u8),
            strategy: strategy?,
        })
    })
}
