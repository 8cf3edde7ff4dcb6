//! Autocert and notification provider configurations

use portico_types::{
    AutocertProvider, ColorMode, MimeType, NotificationProvider, NtfyStyle, OvhEndpoint,
    WebhookMethod, WebhookTemplate,
};
use serde::Serialize;

/// Certificate management settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Autocert {
    #[serde(flatten)]
    pub provider: AutocertConfig,

    /// Certificate file (default: certs/cert.crt)
    pub cert_path: String,

    /// Private key file (default: certs/priv.key)
    pub key_path: String,
}

impl Autocert {
    pub fn provider(&self) -> AutocertProvider {
        self.provider.provider()
    }
}

/// Provider variant, selected by the `provider` discriminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum AutocertConfig {
    Local,
    Cloudflare(Acme<CloudflareOptions>),
    #[serde(rename = "clouddns")]
    CloudDns(Acme<CloudDnsOptions>),
    #[serde(rename = "duckdns")]
    DuckDns(Acme<DuckDnsOptions>),
    Ovh(Acme<OvhOptions>),
    Porkbun(Acme<PorkbunOptions>),
}

impl AutocertConfig {
    pub fn provider(&self) -> AutocertProvider {
        match self {
            AutocertConfig::Local => AutocertProvider::Local,
            AutocertConfig::Cloudflare(_) => AutocertProvider::Cloudflare,
            AutocertConfig::CloudDns(_) => AutocertProvider::CloudDns,
            AutocertConfig::DuckDns(_) => AutocertProvider::DuckDns,
            AutocertConfig::Ovh(_) => AutocertProvider::Ovh,
            AutocertConfig::Porkbun(_) => AutocertProvider::Porkbun,
        }
    }

    /// ACME account email, for every provider except `local`
    pub fn email(&self) -> Option<&str> {
        match self {
            AutocertConfig::Local => None,
            AutocertConfig::Cloudflare(acme) => Some(&acme.email),
            AutocertConfig::CloudDns(acme) => Some(&acme.email),
            AutocertConfig::DuckDns(acme) => Some(&acme.email),
            AutocertConfig::Ovh(acme) => Some(&acme.email),
            AutocertConfig::Porkbun(acme) => Some(&acme.email),
        }
    }
}

/// Settings shared by every ACME DNS provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acme<T> {
    pub email: String,
    pub domains: Vec<String>,
    pub options: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudflareOptions {
    pub auth_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudDnsOptions {
    pub client_id: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuckDnsOptions {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PorkbunOptions {
    pub api_key: String,
    pub secret_api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OvhOptions {
    pub application_secret: String,
    pub consumer_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<OvhEndpoint>,
    #[serde(flatten)]
    pub auth: OvhAuth,
}

/// The two mutually exclusive OVH credential shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OvhAuth {
    ApplicationKey { application_key: String },
    OAuth2 { oauth2_config: OAuth2Config },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
}

/// A notification target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub name: String,
    pub url: String,
    #[serde(flatten)]
    pub provider: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum NotificationConfig {
    Webhook(WebhookOptions),
    Gotify(GotifyOptions),
    Ntfy(NtfyOptions),
}

impl NotificationConfig {
    pub fn provider(&self) -> NotificationProvider {
        match self {
            NotificationConfig::Webhook(_) => NotificationProvider::Webhook,
            NotificationConfig::Gotify(_) => NotificationProvider::Gotify,
            NotificationConfig::Ntfy(_) => NotificationProvider::Ntfy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<WebhookTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Message body, required when no template is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// HTTP method (default: POST)
    pub method: WebhookMethod,
    /// Body MIME type (default: application/json)
    pub mime_type: MimeType,
    /// Color encoding (default: hex)
    pub color_mode: ColorMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GotifyOptions {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NtfyOptions {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Message style (default: markdown)
    pub style: NtfyStyle,
}
