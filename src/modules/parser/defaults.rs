//! Default literals filled into absent fields during the defaulting stage

use portico_types::{
    AccessLogFormat, ColorMode, Duration, FieldMode, MimeType, NtfyStyle, StatusCode, StopMethod,
    WebhookMethod,
};

pub const ACCESS_LOG_BUFFER_SIZE: u64 = 65536;
pub const ACCESS_LOG_FORMAT: AccessLogFormat = AccessLogFormat::Combined;
pub const FIELD_MODE: FieldMode = FieldMode::Keep;

pub const HEALTHCHECK_PATH: &str = "/";
pub const HEALTHCHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const HEALTHCHECK_TIMEOUT: Duration = Duration::from_secs(5);

pub const PROXY_HOST: &str = "localhost";
pub const RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(60);

pub const STOP_METHOD: StopMethod = StopMethod::Stop;
pub const WAKE_TIMEOUT: Duration = Duration::from_secs(30);
pub const STOP_TIMEOUT: Duration = Duration::from_secs(30);

pub const HOMEPAGE_SHOW: bool = true;
pub const USE_DEFAULT_CATEGORIES: bool = true;

pub const CIDR_WHITELIST_STATUS: StatusCode = StatusCode::FORBIDDEN;
pub const CIDR_WHITELIST_MESSAGE: &str = "IP not allowed";
pub const REAL_IP_HEADER: &str = "X-Real-IP";
pub const RATE_LIMIT_PERIOD: Duration = Duration::from_secs(1);

pub const CERT_PATH: &str = "certs/cert.crt";
pub const KEY_PATH: &str = "certs/priv.key";

pub const WEBHOOK_METHOD: WebhookMethod = WebhookMethod::Post;
pub const WEBHOOK_MIME_TYPE: MimeType = MimeType::Json;
pub const WEBHOOK_COLOR_MODE: ColorMode = ColorMode::Hex;
pub const NTFY_STYLE: NtfyStyle = NtfyStyle::Markdown;
