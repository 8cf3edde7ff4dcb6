//! Autocert and notification provider decoding
//!
//! Both constructs are discriminated by their `provider` field; the value
//! selects which option table applies.

use portico_core::{
    Acme, Autocert, AutocertConfig, CloudDnsOptions, CloudflareOptions, ConfigError,
    ConfigErrors, DuckDnsOptions, ErrorKind, FieldPath, GotifyOptions, Notification, NotificationConfig,
    NtfyOptions, OAuth2Config, OvhAuth, OvhOptions, PorkbunOptions, RawNode, WebhookOptions,
};
use portico_types::{
    AutocertProvider, ColorMode, Kind, MimeType, NotificationProvider, NtfyStyle, OvhEndpoint,
    WebhookMethod, WebhookTemplate,
};

use crate::defaults;
use crate::record::Record;
use crate::scalar::{identity, kind, non_empty_list, non_empty_string, string};

type Decoded<T> = Result<T, ConfigErrors>;

pub(crate) fn decode_autocert(path: &FieldPath, node: &RawNode) -> Decoded<Autocert> {
    let mut rec = Record::new(node, path, "autocert")?;
    let Some(provider) = rec.required("provider", identity(&AutocertProvider::ALIASES)) else {
        return Err(rec.abort(ConfigErrors::new()));
    };
    let mut rec = rec.renamed(format!("autocert provider '{}'", provider));

    let cert_path = rec.optional("cert_path", non_empty_string);
    let key_path = rec.optional("key_path", non_empty_string);

    let config = if provider.is_acme() {
        let email = rec.required("email", kind(Kind::Email));
        let domains = rec.required("domains", non_empty_list(kind(Kind::DomainOrWildcard)));
        let what = rec.what().to_string();
        match provider {
            AutocertProvider::Cloudflare => rec
                .required("options", |p, n| record(p, n, &what, cloudflare))
                .map(|options| AutocertConfig::Cloudflare(acme(email, domains, options))),
            AutocertProvider::CloudDns => rec
                .required("options", |p, n| record(p, n, &what, clouddns))
                .map(|options| AutocertConfig::CloudDns(acme(email, domains, options))),
            AutocertProvider::DuckDns => rec
                .required("options", |p, n| record(p, n, &what, duckdns))
                .map(|options| AutocertConfig::DuckDns(acme(email, domains, options))),
            AutocertProvider::Ovh => rec
                .required("options", |p, n| record(p, n, &what, ovh))
                .map(|options| AutocertConfig::Ovh(acme(email, domains, options))),
            AutocertProvider::Porkbun => rec
                .required("options", |p, n| record(p, n, &what, porkbun))
                .map(|options| AutocertConfig::Porkbun(acme(email, domains, options))),
            AutocertProvider::Local => None,
        }
    } else {
        // `options: null` and `options: {}` both mean "no options"
        rec.optional("options", |path, node| match node {
            RawNode::Null => Ok(()),
            RawNode::Map(entries) if entries.is_empty() => Ok(()),
            other => Err(ConfigError::wrong_type(
                path.clone(),
                "null or an empty mapping for the local provider",
                other.type_name(),
            )
            .into()),
        });
        Some(AutocertConfig::Local)
    };

    rec.build(|| {
        Some(Autocert {
            provider: config?,
            cert_path: cert_path.unwrap_or_else(|| defaults::CERT_PATH.to_string()),
            key_path: key_path.unwrap_or_else(|| defaults::KEY_PATH.to_string()),
        })
    })
}

/// Assemble the shared ACME part; `email`/`domains` errors were already recorded
fn acme<T>(email: Option<String>, domains: Option<Vec<String>>, options: T) -> Acme<T> {
    Acme {
        email: email.unwrap_or_default(),
        domains: domains.unwrap_or_default(),
        options,
    }
}

/// Decode a closed option record with `fields`
fn record<T>(
    path: &FieldPath,
    node: &RawNode,
    what: &str,
    fields: impl FnOnce(&mut Record<'_>) -> Option<T>,
) -> Decoded<T> {
    let mut rec = Record::new(node, path, format!("{} options", what))?;
    let value = fields(&mut rec);
    rec.build(|| value)
}

fn cloudflare(rec: &mut Record<'_>) -> Option<CloudflareOptions> {
    let auth_token = rec.required("auth_token", non_empty_string);
    Some(CloudflareOptions {
        auth_token: auth_token?,
    })
}

fn clouddns(rec: &mut Record<'_>) -> Option<CloudDnsOptions> {
    let client_id = rec.required("client_id", non_empty_string);
    let email = rec.required("email", kind(Kind::Email));
    let password = rec.required("password", non_empty_string);
    Some(CloudDnsOptions {
        client_id: client_id?,
        email: email?,
        password: password?,
    })
}

fn duckdns(rec: &mut Record<'_>) -> Option<DuckDnsOptions> {
    let token = rec.required("token", non_empty_string);
    Some(DuckDnsOptions { token: token? })
}

fn porkbun(rec: &mut Record<'_>) -> Option<PorkbunOptions> {
    let api_key = rec.required("api_key", non_empty_string);
    let secret_api_key = rec.required("secret_api_key", non_empty_string);
    Some(PorkbunOptions {
        api_key: api_key?,
        secret_api_key: secret_api_key?,
    })
}

/// OVH carries one of two credential shapes, told apart by which key is present
fn ovh(rec: &mut Record<'_>) -> Option<OvhOptions> {
    let application_secret = rec.required("application_secret", non_empty_string);
    let consumer_key = rec.required("consumer_key", non_empty_string);
    let api_endpoint = rec.optional("api_endpoint", identity(&OvhEndpoint::ALIASES));

    let auth = match (rec.peek("application_key"), rec.peek("oauth2_config")) {
        (Some(_), Some(_)) => {
            rec.take("application_key");
            rec.take("oauth2_config");
            rec.push(ConfigError::invariant(
                rec.path().clone(),
                "application_key and oauth2_config are mutually exclusive",
            ));
            None
        }
        (_, Some(_)) => rec
            .required("oauth2_config", oauth2)
            .map(|oauth2_config| OvhAuth::OAuth2 { oauth2_config }),
        _ => rec
            .required("application_key", non_empty_string)
            .map(|application_key| OvhAuth::ApplicationKey { application_key }),
    };

    Some(OvhOptions {
        application_secret: application_secret?,
        consumer_key: consumer_key?,
        api_endpoint,
        auth: auth?,
    })
}

fn oauth2(path: &FieldPath, node: &RawNode) -> Decoded<OAuth2Config> {
    record(path, node, "OVH", |rec| {
        let client_id = rec.required("client_id", non_empty_string);
        let client_secret = rec.required("client_secret", non_empty_string);
        Some(OAuth2Config {
            client_id: client_id?,
            client_secret: client_secret?,
        })
    })
}

pub(crate) fn decode_notification(path: &FieldPath, node: &RawNode) -> Decoded<Notification> {
    let mut rec = Record::new(node, path, "notification")?;
    let Some(provider) = rec.required("provider", identity(&NotificationProvider::ALIASES)) else {
        return Err(rec.abort(ConfigErrors::new()));
    };
    let mut rec = rec.renamed(format!("notification provider '{}'", provider));

    let name = rec.required("name", non_empty_string);
    let url = rec.required("url", kind(Kind::Url));
    let config = match provider {
        NotificationProvider::Webhook => webhook(&mut rec).map(NotificationConfig::Webhook),
        NotificationProvider::Gotify => {
            let token = rec.required("token", non_empty_string);
            token.map(|token| NotificationConfig::Gotify(GotifyOptions { token }))
        }
        NotificationProvider::Ntfy => ntfy(&mut rec).map(NotificationConfig::Ntfy),
    };

    rec.build(|| {
        Some(Notification {
            name: name?,
            url: url?,
            provider: config?,
        })
    })
}

fn webhook(rec: &mut Record<'_>) -> Option<WebhookOptions> {
    let template = rec.optional("template", identity(&WebhookTemplate::ALIASES));
    let token = rec.optional("token", string);
    let payload = if template.is_some() || rec.peek("template").is_some() {
        rec.optional("payload", string)
    } else {
        rec.required("payload", non_empty_string)
    };
    let method = rec.optional("method", identity(&WebhookMethod::ALIASES));
    let mime_type = rec.optional("mime_type", identity(&MimeType::ALIASES));
    let color_mode = rec.optional("color_mode", identity(&ColorMode::ALIASES));

    Some(WebhookOptions {
        template,
        token,
        payload,
        method: method.unwrap_or(defaults::WEBHOOK_METHOD),
        mime_type: mime_type.unwrap_or(defaults::WEBHOOK_MIME_TYPE),
        color_mode: color_mode.unwrap_or(defaults::WEBHOOK_COLOR_MODE),
    })
}

fn ntfy(rec: &mut Record<'_>) -> Option<NtfyOptions> {
    let topic = rec.required("topic", |path, node| {
        let topic = non_empty_string(path, node)?;
        if topic.starts_with('/') {
            return Err(ConfigError::new(
                path.clone(),
                ErrorKind::PatternMismatch,
                "topic must not start with '/'",
            )
            .into());
        }
        Ok(topic)
    });
    let token = rec.optional("token", string);
    let style = rec.optional("style", identity(&NtfyStyle::ALIASES));
    Some(NtfyOptions {
        topic: topic?,
        token,
        style: style.unwrap_or(defaults::NTFY_STYLE),
    })
}
