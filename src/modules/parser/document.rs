//! YAML / JSON document parsing into [`RawNode`] trees

use portico_core::{PorticoError, RawNode};
use std::path::Path;

/// Source format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON, everything else is YAML
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parser for configuration documents
pub struct DocumentParser;

impl DocumentParser {
    /// Parse `content` (already placeholder-substituted) into a raw tree
    pub fn parse(name: &str, content: &str, format: DocumentFormat) -> Result<RawNode, PorticoError> {
        let parse_error = |message: String| PorticoError::Parse {
            document: name.to_string(),
            message,
        };

        match format {
            DocumentFormat::Json => serde_json::from_str::<serde_json::Value>(content)
                .map(RawNode::from)
                .map_err(|e| parse_error(e.to_string())),
            DocumentFormat::Yaml => {
                let value = serde_yaml::from_str::<serde_yaml::Value>(content)
                    .map_err(|e| parse_error(e.to_string()))?;
                from_yaml(value).map_err(parse_error)
            }
        }
    }

    /// Render a raw tree as text in the given format
    pub fn render(node: &RawNode, format: DocumentFormat) -> Result<String, PorticoError> {
        match format {
            DocumentFormat::Json => Ok(serde_json::to_string_pretty(node)?),
            DocumentFormat::Yaml => Ok(serde_yaml::to_string(node)?),
        }
    }
}

fn from_yaml(value: serde_yaml::Value) -> Result<RawNode, String> {
    use serde_yaml::Value;

    Ok(match value {
        Value::Null => RawNode::Null,
        Value::Bool(b) => RawNode::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => RawNode::Int(i),
            None => RawNode::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => RawNode::String(s),
        Value::Sequence(items) => RawNode::Seq(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Mapping(mapping) => {
            let mut entries = Vec::with_capacity(mapping.len());
            for (key, value) in mapping {
                entries.push((yaml_key(key)?, from_yaml(value)?));
            }
            RawNode::Map(entries)
        }
        Value::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, String> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("unsupported mapping key: {:?}", other)),
    }
}
