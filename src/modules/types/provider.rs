//! Autocert and notification provider identities

use crate::alias::construct;

construct! {
    /// DNS / certificate provider used by autocert
    pub enum AutocertProvider in "autocert provider" {
        Local => "local",
        Cloudflare => "cloudflare",
        CloudDns => "clouddns",
        DuckDns => "duckdns",
        Ovh => "ovh",
        Porkbun => "porkbun",
    }
}

impl AutocertProvider {
    /// Providers that obtain certificates through ACME and need email/domains
    pub fn is_acme(&self) -> bool {
        !matches!(self, AutocertProvider::Local)
    }
}

construct! {
    /// OVH API endpoint
    pub enum OvhEndpoint in "OVH endpoint" {
        OvhEu => "ovh-eu",
        OvhCa => "ovh-ca",
        OvhUs => "ovh-us",
        KimsufiEu => "kimsufi-eu",
        KimsufiCa => "kimsufi-ca",
        SoyoustartEu => "soyoustart-eu",
        SoyoustartCa => "soyoustart-ca",
    }
}

construct! {
    /// Notification delivery provider
    pub enum NotificationProvider in "notification provider" {
        Webhook => "webhook",
        Gotify => "gotify",
        Ntfy => "ntfy",
    }
}

construct! {
    pub enum WebhookTemplate in "webhook template" {
        Discord => "discord",
    }
}

construct! {
    pub enum WebhookMethod in "webhook method" {
        Post => "POST",
        Get => "GET",
        Put => "PUT",
    }
}

construct! {
    pub enum MimeType in "webhook MIME type" {
        Json => "application/json",
        FormUrlEncoded => "application/x-www-form-urlencoded",
        PlainText => "text/plain",
        Markdown => "text/markdown",
    }
}

construct! {
    pub enum ColorMode in "webhook color mode" {
        Hex => "hex",
        Dec => "dec",
    }
}

construct! {
    pub enum NtfyStyle in "ntfy style" {
        Markdown => "markdown",
        Plain => "plain",
    }
}
