//! Canonical configuration back to raw documents

use portico_core::{CanonicalConfig, PorticoError, RawNode};

use crate::document::{DocumentFormat, DocumentParser};
use crate::env::EnvSubstitutor;
use crate::reference::MemorySource;

/// Main document plus one document per include file
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDocuments {
    pub main: RawNode,
    /// Include files in `providers.include` order
    pub includes: Vec<(String, RawNode)>,
}

impl EncodedDocuments {
    /// Reference source serving the encoded include files
    pub fn to_memory_source(&self) -> Result<MemorySource, PorticoError> {
        self.includes
            .iter()
            .try_fold(MemorySource::new(), |source, (name, node)| {
                let text = DocumentParser::render(node, DocumentFormat::Yaml)?;
                Ok(source.with_include(name.as_str(), text))
            })
    }

    /// Main document as text
    pub fn render_main(&self, format: DocumentFormat) -> Result<String, PorticoError> {
        DocumentParser::render(&self.main, format)
    }
}

/// Encode a configuration so that loading the result yields an equal configuration
pub fn encode(config: &CanonicalConfig) -> Result<EncodedDocuments, PorticoError> {
    let main = escape(RawNode::from(serde_json::to_value(config)?));

    let by_source = config.routes_by_source();
    let mut includes = Vec::with_capacity(config.providers.include.len());
    for file in &config.providers.include {
        let mut routes = Vec::new();
        for (name, route) in by_source.get(file.as_str()).into_iter().flatten() {
            let node = RawNode::from(serde_json::to_value(route)?);
            routes.push((name.to_string(), escape(node)));
        }
        includes.push((file.clone(), RawNode::Map(routes)));
    }

    Ok(EncodedDocuments { main, includes })
}

/// Protect literal `$` from placeholder substitution on reload
fn escape(node: RawNode) -> RawNode {
    match node {
        RawNode::String(s) => RawNode::String(EnvSubstitutor::escape(&s)),
        RawNode::Seq(items) => RawNode::Seq(items.into_iter().map(escape).collect()),
        RawNode::Map(entries) => RawNode::Map(
            entries
                .into_iter()
                .map(|(key, value)| (EnvSubstitutor::escape(&key), escape(value)))
                .collect(),
        ),
        other => other,
    }
}
