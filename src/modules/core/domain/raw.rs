//! Untyped document tree produced by the document parsers

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A parsed document node. Mappings keep their source key order.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Seq(Vec<RawNode>),
    Map(Vec<(String, RawNode)>),
}

impl RawNode {
    /// Empty mapping
    pub fn map() -> Self {
        RawNode::Map(Vec::new())
    }

    /// Name of the node's shape, used in type mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RawNode::Null => "null",
            RawNode::Bool(_) => "boolean",
            RawNode::Int(_) => "integer",
            RawNode::Float(_) => "number",
            RawNode::String(_) => "string",
            RawNode::Seq(_) => "sequence",
            RawNode::Map(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawNode::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, RawNode)]> {
        match self {
            RawNode::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[RawNode]> {
        match self {
            RawNode::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Textual form of a scalar; `None` for null, sequences and mappings
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            RawNode::Bool(b) => Some(b.to_string()),
            RawNode::Int(i) => Some(i.to_string()),
            RawNode::Float(f) => Some(f.to_string()),
            RawNode::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Look up a key of a mapping node
    pub fn get(&self, key: &str) -> Option<&RawNode> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }
}

impl From<&str> for RawNode {
    fn from(value: &str) -> Self {
        RawNode::String(value.to_string())
    }
}

impl From<serde_json::Value> for RawNode {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => RawNode::Null,
            Value::Bool(b) => RawNode::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawNode::Int(i),
                None => RawNode::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => RawNode::String(s),
            Value::Array(items) => RawNode::Seq(items.into_iter().map(RawNode::from).collect()),
            Value::Object(entries) => RawNode::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, RawNode::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for RawNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawNode::Null => serializer.serialize_unit(),
            RawNode::Bool(b) => serializer.serialize_bool(*b),
            RawNode::Int(i) => serializer.serialize_i64(*i),
            RawNode::Float(f) => serializer.serialize_f64(*f),
            RawNode::String(s) => serializer.serialize_str(s),
            RawNode::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            RawNode::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_order() {
        let node = RawNode::from(json!({"b": 1, "a": [true, null, "x"], "c": 1.5}));
        let keys: Vec<&str> = node
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(node.get("b"), Some(&RawNode::Int(1)));
        assert_eq!(node.get("c").map(RawNode::type_name), Some("number"));
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(RawNode::Int(443).scalar_text().as_deref(), Some("443"));
        assert_eq!(RawNode::from("80").scalar_text().as_deref(), Some("80"));
        assert_eq!(RawNode::Null.scalar_text(), None);
        assert_eq!(RawNode::map().scalar_text(), None);
    }

    #[test]
    fn test_serialize_roundtrip_through_json() {
        let node = RawNode::Map(vec![
            ("z".to_string(), RawNode::Seq(vec![RawNode::Int(1), RawNode::Null])),
            ("a".to_string(), RawNode::from("x")),
        ]);
        let text = serde_json::to_string(&node).unwrap();
        assert_eq!(text, r#"{"z":[1,null],"a":"x"}"#);
        let back = RawNode::from(serde_json::from_str::<serde_json::Value>(&text).unwrap());
        assert_eq!(back, node);
    }
}
