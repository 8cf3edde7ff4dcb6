//! Route variants, load balancing and idle watching

use portico_types::{
    Duration, LoadBalanceMode, Port, RouteKind, Scheme, StopMethod, StopSignal, StreamPort,
};
use serde::{Serialize, Serializer};

use super::middleware::{MiddlewareChain, RealIpOptions};
use super::types::{AccessLog, HealthCheck, HomepageItem};

fn is_false(value: &bool) -> bool {
    !*value
}

/// One route, selected by its scheme
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    ReverseProxy(ReverseProxyRoute),
    Stream(StreamRoute),
    FileServer(FileServerRoute),
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Route::ReverseProxy(_) => RouteKind::ReverseProxy,
            Route::Stream(_) => RouteKind::Stream,
            Route::FileServer(_) => RouteKind::FileServer,
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Route::ReverseProxy(route) => route.scheme,
            Route::Stream(route) => route.scheme,
            Route::FileServer(_) => Scheme::FileServer,
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            Route::ReverseProxy(route) => &route.alias,
            Route::Stream(route) => &route.alias,
            Route::FileServer(route) => &route.alias,
        }
    }

    pub fn middlewares(&self) -> Option<&MiddlewareChain> {
        match self {
            Route::ReverseProxy(route) => Some(&route.middlewares),
            Route::FileServer(route) => Some(&route.middlewares),
            Route::Stream(_) => None,
        }
    }

    pub fn healthcheck(&self) -> Option<&HealthCheck> {
        match self {
            Route::ReverseProxy(route) => route.healthcheck.as_ref(),
            Route::Stream(route) => route.healthcheck.as_ref(),
            Route::FileServer(route) => route.healthcheck.as_ref(),
        }
    }

    pub fn idle_watcher(&self) -> Option<&IdleWatcher> {
        match self {
            Route::ReverseProxy(route) => route.idle_watcher.as_ref(),
            Route::Stream(route) => route.idle_watcher.as_ref(),
            Route::FileServer(_) => None,
        }
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct FileServer<'a> {
            scheme: Scheme,
            #[serde(flatten)]
            route: &'a FileServerRoute,
        }

        match self {
            Route::ReverseProxy(route) => route.serialize(serializer),
            Route::Stream(route) => route.serialize(serializer),
            Route::FileServer(route) => FileServer {
                scheme: Scheme::FileServer,
                route,
            }
            .serialize(serializer),
        }
    }
}

/// HTTP(S) reverse proxy route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseProxyRoute {
    /// Subdomain or FQDN the route answers on (default: route name)
    pub alias: String,

    /// http or https (inferred from the port when absent)
    pub scheme: Scheme,

    /// Target host (default: localhost)
    pub host: String,

    /// Target port (default: 80, 443 for https)
    pub port: Port,

    /// Skip TLS verification of the target (default: false)
    #[serde(skip_serializing_if = "is_false")]
    pub no_tls_verify: bool,

    /// Time allowed for the target to send response headers (default: 60s)
    pub response_header_timeout: Duration,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_patterns: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheck>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balance: Option<LoadBalance>,

    #[serde(skip_serializing_if = "MiddlewareChain::is_empty")]
    pub middlewares: MiddlewareChain,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<HomepageItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_log: Option<AccessLog>,

    #[serde(flatten)]
    pub idle_watcher: Option<IdleWatcher>,
}

/// TCP/UDP stream route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamRoute {
    pub alias: String,

    /// tcp or udp
    pub scheme: Scheme,

    /// Target host (default: localhost)
    pub host: String,

    pub port: StreamPort,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheck>,

    #[serde(flatten)]
    pub idle_watcher: Option<IdleWatcher>,
}

/// Static file server route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileServerRoute {
    pub alias: String,

    /// Directory served
    pub root: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_patterns: Vec<String>,

    #[serde(skip_serializing_if = "MiddlewareChain::is_empty")]
    pub middlewares: MiddlewareChain,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<HomepageItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_log: Option<AccessLog>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheck>,
}

/// Load balancer membership of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadBalance {
    /// Alias of the load balancer this route joins
    pub link: String,

    /// Weight between 0 and 100; absent means unweighted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,

    #[serde(flatten)]
    pub strategy: LoadBalanceStrategy,
}

impl LoadBalance {
    pub fn mode(&self) -> LoadBalanceMode {
        self.strategy.mode()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LoadBalanceStrategy {
    RoundRobin,
    LeastConn,
    IpHash { config: RealIpOptions },
}

impl LoadBalanceStrategy {
    pub fn mode(&self) -> LoadBalanceMode {
        match self {
            LoadBalanceStrategy::RoundRobin => LoadBalanceMode::RoundRobin,
            LoadBalanceStrategy::LeastConn => LoadBalanceMode::LeastConn,
            LoadBalanceStrategy::IpHash { .. } => LoadBalanceMode::IpHash,
        }
    }
}

/// Idle watcher settings, stored flat on the route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdleWatcher {
    /// Idle time before the target is stopped
    pub idle_timeout: Duration,

    /// Time allowed for the target to wake (default: 30s)
    pub wake_timeout: Duration,

    /// Time allowed for the target to stop (default: 30s)
    pub stop_timeout: Duration,

    /// default: stop
    pub stop_method: StopMethod,

    /// Only acted on when `stop_method` is kill
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<StopSignal>,

    /// Path that triggers a wake-up, without fragment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_endpoint: Option<String>,
}
