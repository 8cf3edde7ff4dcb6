//! Cross-field invariant checks

use portico_core::{
    AccessLog, ConfigError, ConfigErrors, Entrypoint, ErrorKind, FieldPath, FieldPolicy,
    LoadBalanceStrategy, Route,
};
use portico_types::{validate_text, Kind};
use std::collections::HashMap;

use crate::record::Record;
use crate::route::RouteDraft;

/// Fields only meaningful on HTTP routes
pub(crate) const STREAM_FORBIDDEN: &[&str] = &[
    "no_tls_verify",
    "response_header_timeout",
    "path_patterns",
    "load_balance",
    "middlewares",
    "homepage",
    "access_log",
];

/// Fields describing a proxy target
pub(crate) const FILE_SERVER_FORBIDDEN: &[&str] = &[
    "host",
    "port",
    "no_tls_verify",
    "response_header_timeout",
    "load_balance",
];

/// Report every present field of `fields` as not allowed for this record's variant
pub(crate) fn forbid(rec: &mut Record<'_>, fields: &[&'static str]) {
    for &field in fields {
        if let Some((path, _)) = rec.take(field) {
            let message = format!("'{}' is not allowed for {}", field, rec.what());
            rec.push(ConfigError::invariant(path, message));
        }
    }
}

/// Invariant checker run over the decoded, defaulted route set
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check every invariant and report all violations together
    pub fn validate(&self, drafts: &[RouteDraft], entrypoint: Option<&Entrypoint>) -> Result<(), ConfigErrors> {
        let mut errors = ConfigErrors::new();

        self.validate_aliases(drafts, &mut errors);
        for draft in drafts {
            self.validate_load_balance(draft, &mut errors);
            if let Some(log) = access_log(&draft.route) {
                self.validate_access_log(&draft.path.key("access_log"), log, &mut errors);
            }
        }
        if let Some(log) = entrypoint.and_then(|e| e.access_log.as_ref()) {
            let path = FieldPath::of("entrypoint").key("access_log");
            self.validate_access_log(&path, log, &mut errors);
        }

        errors.into_result(())
    }

    /// Aliases must be unique across the whole route set
    fn validate_aliases(&self, drafts: &[RouteDraft], errors: &mut ConfigErrors) {
        let mut seen: HashMap<&str, &RouteDraft> = HashMap::new();

        for draft in drafts {
            let alias = draft.route.alias();
            match seen.get(alias) {
                Some(first) => errors.push(ConfigError::new(
                    draft.alias_path(),
                    ErrorKind::DuplicateAlias,
                    format!(
                        "alias '{}' of route '{}' in {} is already used by route '{}' in {}",
                        alias, draft.name, draft.source, first.name, first.source
                    ),
                )),
                None => {
                    seen.insert(alias, draft);
                }
            }
        }
    }

    /// ip_hash needs at least one trusted network to read the client address from
    fn validate_load_balance(&self, draft: &RouteDraft, errors: &mut ConfigErrors) {
        let Route::ReverseProxy(route) = &draft.route else {
            return;
        };
        if let Some(LoadBalanceStrategy::IpHash { config }) =
            route.load_balance.as_ref().map(|lb| &lb.strategy)
        {
            if config.from.is_empty() {
                errors.push(ConfigError::invariant(
                    draft.path.key("load_balance").key("config").key("from"),
                    "ip_hash requires at least one CIDR in 'from'",
                ));
            }
        }
    }

    /// Redaction config keys must be legal header, query or cookie names
    fn validate_access_log(&self, path: &FieldPath, log: &AccessLog, errors: &mut ConfigErrors) {
        let fields = path.key("fields");
        let policies = [
            ("header", Kind::HttpHeader, log.fields.header.as_ref()),
            ("query", Kind::HttpQuery, log.fields.query.as_ref()),
            ("cookie", Kind::HttpCookie, log.fields.cookie.as_ref()),
        ];

        for (name, kind, policy) in policies {
            let Some(FieldPolicy { config, .. }) = policy else {
                continue;
            };
            for key in config.keys() {
                if let Err(e) = validate_text(kind, key) {
                    errors.push(ConfigError::invariant(
                        fields.key(name).key("config").key(key.as_str()),
                        e.to_string(),
                    ));
                }
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn access_log(route: &Route) -> Option<&AccessLog> {
    match route {
        Route::ReverseProxy(route) => route.access_log.as_ref(),
        Route::FileServer(route) => route.access_log.as_ref(),
        Route::Stream(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, DocumentParser};
    use crate::reference::MemorySource;
    use crate::route::decode_routes;

    fn drafts(file: &str, text: &str) -> Vec<RouteDraft> {
        let node = DocumentParser::parse(file, text, DocumentFormat::Yaml).unwrap();
        let mut drafts = decode_routes(&MemorySource::new(), file, &node).unwrap();
        drafts.iter_mut().for_each(RouteDraft::apply_defaults);
        drafts
    }

    #[test]
    fn test_duplicate_alias_names_both_sources() {
        let mut all = drafts("a.yml", "web:\n  alias: site\n");
        all.extend(drafts("b.yml", "site:\n  port: 8080\n"));

        let errors = ConfigValidator::new().validate(&all, None).unwrap_err();
        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().unwrap();
        assert_eq!(error.kind, ErrorKind::DuplicateAlias);
        assert_eq!(error.path.to_string(), "b.yml.site.alias");
        assert!(error.message.contains("a.yml"));
        assert!(error.message.contains("b.yml"));
    }

    #[test]
    fn test_ip_hash_requires_from() {
        let lb = "app:\n  load_balance:\n    link: app\n    mode: ip_hash\n    config:\n";
        let empty = drafts("a.yml", &format!("{}      from: []\n", lb));
        let errors = ConfigValidator::new().validate(&empty, None).unwrap_err();
        assert_eq!(errors.count(ErrorKind::InvariantViolation), 1);

        let one = drafts("a.yml", &format!("{}      from: [10.0.0.0/8]\n", lb));
        assert!(ConfigValidator::new().validate(&one, None).is_ok());
    }

    #[test]
    fn test_field_config_keys() {
        let all = drafts(
            "a.yml",
            "app:\n  access_log:\n    path: /tmp/a.log\n    fields:\n      query:\n        config:\n          'bad key': drop\n          token: redact\n",
        );
        let errors = ConfigValidator::new().validate(&all, None).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next().unwrap().path.to_string(),
            "a.yml.app.access_log.fields.query.config.bad key"
        );
    }
}
