//! Top-level document decoding (everything except include-file routes)

use portico_core::{
    CanonicalConfig, ConfigError, ConfigErrors, Entrypoint, FieldPath, HomepageSettings,
    Providers, RawNode,
};
use portico_types::{Duration, Kind};

use crate::access_log::decode_access_log;
use crate::defaults;
use crate::middleware::decode_chain;
use crate::provider::{decode_autocert, decode_notification};
use crate::record::Record;
use crate::reference::ReferenceSource;
use crate::scalar::{boolean, duration, kind, list, non_empty_list, string_map};

type Decoded<T> = Result<T, ConfigErrors>;

/// Decode the main document; routes are filled in later from the include files
pub(crate) fn decode_config(source: &dyn ReferenceSource, node: &RawNode) -> Decoded<CanonicalConfig> {
    let mut rec = Record::new(node, &FieldPath::root(), "configuration")?;
    let autocert = rec.optional("autocert", decode_autocert);
    let entrypoint = rec.optional("entrypoint", |path, node| decode_entrypoint(source, path, node));
    let providers = rec.required("providers", decode_providers);
    let match_domains = rec.optional("match_domains", non_empty_list(kind(Kind::DomainName)));
    let homepage = rec.optional("homepage", decode_homepage);
    let timeout_shutdown = rec.optional("timeout_shutdown", shutdown_timeout);

    rec.build(|| {
        Some(CanonicalConfig {
            autocert,
            entrypoint,
            providers: providers?,
            match_domains: match_domains.unwrap_or_default(),
            homepage,
            timeout_shutdown,
            routes: Default::default(),
        })
    })
}

fn decode_entrypoint(
    source: &dyn ReferenceSource,
    path: &FieldPath,
    node: &RawNode,
) -> Decoded<Entrypoint> {
    let mut rec = Record::new_or_empty(node, path, "entrypoint")?;
    let middlewares = rec.optional("middlewares", |path, node| decode_chain(source, path, node));
    let access_log = rec.optional("access_log", decode_access_log);
    rec.build(|| {
        Some(Entrypoint {
            middlewares: middlewares.unwrap_or_default(),
            access_log,
        })
    })
}

fn decode_providers(path: &FieldPath, node: &RawNode) -> Decoded<Providers> {
    let mut rec = Record::new_or_empty(node, path, "providers")?;
    let include = rec.optional("include", non_empty_list(kind(Kind::IncludeFile)));
    let docker = rec.optional("docker", |path, node| {
        let hosts = string_map(None, kind(Kind::DockerHost))(path, node)?;
        if hosts.is_empty() {
            return Err(ConfigError::range(path.clone(), "must contain at least one docker host").into());
        }
        Ok(hosts)
    });
    let agents = rec.optional("agents", list(kind(Kind::AgentAddress)));
    let notification = rec.optional("notification", non_empty_list(decode_notification));

    rec.build(|| {
        Some(Providers {
            include: include.unwrap_or_default(),
            docker: docker.unwrap_or_default(),
            agents: agents.unwrap_or_default(),
            notification: notification.unwrap_or_default(),
        })
    })
}

fn decode_homepage(path: &FieldPath, node: &RawNode) -> Decoded<HomepageSettings> {
    let mut rec = Record::new_or_empty(node, path, "homepage")?;
    let use_default_categories = rec.optional("use_default_categories", boolean);
    rec.build(|| {
        Some(HomepageSettings {
            use_default_categories: use_default_categories.unwrap_or(defaults::USE_DEFAULT_CATEGORIES),
        })
    })
}

/// Whole seconds (>= 1) or a duration string
fn shutdown_timeout(path: &FieldPath, node: &RawNode) -> Decoded<Duration> {
    match node {
        RawNode::Int(secs) if *secs >= 1 => Ok(Duration::from_secs(*secs as u64)),
        RawNode::Int(secs) => Err(ConfigError::range(
            path.clone(),
            format!("{} is out of range: expected at least 1 second", secs),
        )
        .into()),
        _ => duration(path, node),
    }
}

/// Include file names as written in `providers.include`, valid or not
pub(crate) fn include_names(node: &RawNode) -> Vec<Option<String>> {
    node.get("providers")
        .and_then(|providers| providers.get("include"))
        .and_then(RawNode::as_seq)
        .map(|items| items.iter().map(RawNode::scalar_text).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, DocumentParser};
    use crate::reference::MemorySource;
    use portico_core::ErrorKind;

    fn decode(text: &str) -> Decoded<CanonicalConfig> {
        let node = DocumentParser::parse("config.yml", text, DocumentFormat::Yaml).unwrap();
        decode_config(&MemorySource::new(), &node)
    }

    #[test]
    fn test_minimal_document() {
        let config = decode("providers:\n").unwrap();
        assert_eq!(config, CanonicalConfig::default());
        assert!(decode("providers: {}\n").is_ok());
    }

    #[test]
    fn test_providers_required_and_closed() {
        let errors = decode("match_domains: [example.com]\n").unwrap_err();
        assert_eq!(errors.count(ErrorKind::MissingField), 1);

        let errors = decode("providers:\n  includes: [a.yml]\n").unwrap_err();
        let error = errors.iter().next().unwrap();
        assert_eq!(error.kind, ErrorKind::UnexpectedField);
        assert!(error.message.contains("did you mean 'include'"));
    }

    #[test]
    fn test_full_document() {
        let config = decode(
            r#"
autocert:
  provider: local
entrypoint:
  middlewares:
    - use: CIDRWhitelist
      allow: [127.0.0.1, 10.0.0.0/8]
providers:
  include: [apps.yml, db.yaml]
  docker:
    local: unix:///var/run/docker.sock
  agents: [10.0.0.2:8890]
  notification:
    - name: gotify
      provider: gotify
      url: https://gotify.example.com
      token: abc
match_domains: [example.com]
homepage:
  use_default_categories: false
timeout_shutdown: 10
"#,
        )
        .unwrap();
        assert_eq!(config.providers.include, vec!["apps.yml", "db.yaml"]);
        assert_eq!(config.providers.notification.len(), 1);
        assert_eq!(config.entrypoint.unwrap().middlewares.len(), 1);
        assert_eq!(config.timeout_shutdown, Some(Duration::from_secs(10)));
        assert_eq!(config.homepage.map(|h| h.use_default_categories), Some(false));
    }

    #[test]
    fn test_field_errors() {
        let errors = decode(
            "providers:\n  include: [apps.txt]\n  docker: {}\nmatch_domains: [Example.com]\ntimeout_shutdown: 0\n",
        )
        .unwrap_err();
        let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "providers.include[0]",
                "providers.docker",
                "match_domains[0]",
                "timeout_shutdown",
            ]
        );
    }

    #[test]
    fn test_include_names() {
        let node = DocumentParser::parse(
            "c.yml",
            "providers:\n  include: [a.yml, 3, {x: 1}]\n",
            DocumentFormat::Yaml,
        )
        .unwrap();
        assert_eq!(
            include_names(&node),
            vec![Some("a.yml".to_string()), Some("3".to_string()), None]
        );
    }
}
