//! Domain models for Portico configuration

mod middleware;
mod model;
mod provider;
mod raw;
mod route;
mod types;

pub use middleware::{
    ChainSlot, CidrWhitelistOptions, CloudflareRealIpOptions, Middleware, MiddlewareChain,
    MiddlewareOptions, ModifyHeadersOptions, OidcOptions, RateLimitOptions, RealIpOptions,
};
pub use model::{CanonicalConfig, Entrypoint, Providers, RouteEntry};
pub use provider::{
    Acme, Autocert, AutocertConfig, CloudDnsOptions, CloudflareOptions, DuckDnsOptions,
    GotifyOptions, Notification, NotificationConfig, NtfyOptions, OAuth2Config, OvhAuth,
    OvhOptions, PorkbunOptions, WebhookOptions,
};
pub use raw::RawNode;
pub use route::{
    FileServerRoute, IdleWatcher, LoadBalance, LoadBalanceStrategy, ReverseProxyRoute, Route,
    StreamRoute,
};
pub use types::{
    AccessLog, AccessLogFields, AccessLogFilters, FieldPolicy, HealthCheck, HomepageItem,
    HomepageSettings, LogFilter,
};
