//! Type definitions for Portico
//!
//! This crate contains the scalar value types and construct identities shared
//! across the Portico codebase: primitive validators, alias tables and the
//! closed enums selected by configuration discriminators.

mod alias;

pub mod access_log;
pub mod duration;
pub mod middleware;
pub mod net;
pub mod primitive;
pub mod provider;
pub mod route;
pub mod status;

pub use access_log::{AccessLogFormat, FieldMode, HttpMethod};
pub use alias::{did_you_mean, AliasTable, UnknownAlias};
pub use duration::Duration;
pub use middleware::{MiddlewareKind, MiddlewareName, FILE_REF_SUFFIX};
pub use net::{Cidr, Port, StreamPort};
pub use primitive::{is_host, validate, validate_text, Kind, PrimitiveError, Validated};
pub use provider::{
    AutocertProvider, ColorMode, MimeType, NotificationProvider, NtfyStyle, OvhEndpoint,
    WebhookMethod, WebhookTemplate,
};
pub use route::{LoadBalanceMode, RouteKind, Scheme, StopMethod, StopSignal};
pub use status::{StatusCode, StatusCodeRange};
