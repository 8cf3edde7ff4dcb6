//! Field decoders for scalar values, lists and string maps
//!
//! Every decoder has the shape `fn(&FieldPath, &RawNode) -> Result<T, ConfigErrors>`
//! so it can be handed straight to [`Record`](crate::record::Record) reads.

use portico_core::{ConfigError, ConfigErrors, FieldPath, RawNode};
use portico_types::{
    validate_text, AliasTable, Cidr, Duration, Kind, Port, PrimitiveError, StatusCode,
    StatusCodeRange, StreamPort,
};
use std::collections::BTreeMap;

type Decoded<T> = Result<T, ConfigErrors>;

fn primitive(path: &FieldPath, err: PrimitiveError) -> ConfigErrors {
    ConfigError::primitive(path.clone(), &err).into()
}

fn wrong_type(path: &FieldPath, expected: &str, node: &RawNode) -> ConfigErrors {
    ConfigError::wrong_type(path.clone(), expected, node.type_name()).into()
}

/// Any scalar except booleans, in its textual form
pub(crate) fn string(path: &FieldPath, node: &RawNode) -> Decoded<String> {
    match node {
        RawNode::String(s) => Ok(s.clone()),
        RawNode::Int(_) | RawNode::Float(_) => Ok(node.scalar_text().unwrap_or_default()),
        other => Err(wrong_type(path, "a string", other)),
    }
}

pub(crate) fn non_empty_string(path: &FieldPath, node: &RawNode) -> Decoded<String> {
    let value = string(path, node)?;
    if value.is_empty() {
        return Err(ConfigError::new(
            path.clone(),
            portico_core::ErrorKind::PatternMismatch,
            "must not be empty",
        )
        .into());
    }
    Ok(value)
}

pub(crate) fn boolean(path: &FieldPath, node: &RawNode) -> Decoded<bool> {
    match node {
        RawNode::Bool(b) => Ok(*b),
        other => Err(wrong_type(path, "a boolean", other)),
    }
}

/// Integer, or a string holding one
pub(crate) fn integer(path: &FieldPath, node: &RawNode) -> Decoded<i64> {
    match node {
        RawNode::Int(i) => Ok(*i),
        RawNode::String(s) => s.trim().parse().map_err(|_| wrong_type(path, "an integer", node)),
        other => Err(wrong_type(path, "an integer", other)),
    }
}

/// Integer within `min..=max`
pub(crate) fn bounded(min: i64, max: i64) -> impl Fn(&FieldPath, &RawNode) -> Decoded<i64> {
    move |path: &FieldPath, node: &RawNode| {
        let value = integer(path, node)?;
        if value < min || value > max {
            let message = if max == i64::MAX {
                format!("{} is out of range: expected at least {}", value, min)
            } else {
                format!("{} is out of range: expected {} to {}", value, min, max)
            };
            return Err(ConfigError::range(path.clone(), message).into());
        }
        Ok(value)
    }
}

/// String validated against a primitive kind
pub(crate) fn kind(kind: Kind) -> impl Fn(&FieldPath, &RawNode) -> Decoded<String> {
    move |path: &FieldPath, node: &RawNode| {
        let raw = string(path, node)?;
        validate_text(kind, &raw).map_err(|e| primitive(path, e))
    }
}

pub(crate) fn duration(path: &FieldPath, node: &RawNode) -> Decoded<Duration> {
    let raw = match node {
        RawNode::String(s) => s,
        other => return Err(wrong_type(path, "a duration string", other)),
    };
    Duration::parse(raw).map_err(|e| primitive(path, e))
}

pub(crate) fn cidr(path: &FieldPath, node: &RawNode) -> Decoded<Cidr> {
    let raw = string(path, node)?;
    Cidr::parse(&raw).map_err(|e| primitive(path, e))
}

pub(crate) fn port(path: &FieldPath, node: &RawNode) -> Decoded<Port> {
    match node {
        RawNode::Int(i) => Port::from_int(*i).map_err(|e| primitive(path, e)),
        RawNode::String(s) => Port::parse(s).map_err(|e| primitive(path, e)),
        other => Err(wrong_type(path, "a port", other)),
    }
}

pub(crate) fn stream_port(path: &FieldPath, node: &RawNode) -> Decoded<StreamPort> {
    let raw = string(path, node)?;
    StreamPort::parse(&raw).map_err(|e| primitive(path, e))
}

pub(crate) fn status_code(path: &FieldPath, node: &RawNode) -> Decoded<StatusCode> {
    match node {
        RawNode::Int(i) => StatusCode::from_int(*i).map_err(|e| primitive(path, e)),
        RawNode::String(s) => StatusCode::parse(s).map_err(|e| primitive(path, e)),
        other => Err(wrong_type(path, "a status code", other)),
    }
}

pub(crate) fn status_code_range(path: &FieldPath, node: &RawNode) -> Decoded<StatusCodeRange> {
    match node {
        RawNode::Int(i) => StatusCodeRange::from_int(*i).map_err(|e| primitive(path, e)),
        RawNode::String(s) => StatusCodeRange::parse(s).map_err(|e| primitive(path, e)),
        other => Err(wrong_type(path, "a status code range", other)),
    }
}

/// Construct name resolved through its alias table
pub(crate) fn identity<T: Copy + PartialEq + 'static>(
    table: &'static AliasTable<T>,
) -> impl Fn(&FieldPath, &RawNode) -> Decoded<T> {
    move |path: &FieldPath, node: &RawNode| {
        let raw = match node {
            RawNode::String(s) => s,
            other => return Err(wrong_type(path, &format!("a {} name", table.class()), other)),
        };
        table
            .resolve(raw)
            .map_err(|e| ConfigError::unknown_construct(path.clone(), &e).into())
    }
}

/// Sequence whose items are decoded independently
pub(crate) fn list<T>(
    item: impl Fn(&FieldPath, &RawNode) -> Decoded<T>,
) -> impl Fn(&FieldPath, &RawNode) -> Decoded<Vec<T>> {
    move |path: &FieldPath, node: &RawNode| {
        let items = match node {
            RawNode::Seq(items) => items,
            other => return Err(wrong_type(path, "a sequence", other)),
        };
        let mut errors = ConfigErrors::new();
        let mut values = Vec::with_capacity(items.len());
        for (i, raw) in items.iter().enumerate() {
            if let Some(value) = errors.absorb(item(&path.index(i), raw)) {
                values.push(value);
            }
        }
        errors.into_result(values)
    }
}

/// Sequence with at least one item
pub(crate) fn non_empty_list<T>(
    item: impl Fn(&FieldPath, &RawNode) -> Decoded<T>,
) -> impl Fn(&FieldPath, &RawNode) -> Decoded<Vec<T>> {
    let decode = list(item);
    move |path: &FieldPath, node: &RawNode| {
        let values = decode(path, node)?;
        if values.is_empty() {
            return Err(ConfigError::range(path.clone(), "must contain at least one item").into());
        }
        Ok(values)
    }
}

/// Mapping with string keys (optionally validated against `key_kind`)
pub(crate) fn string_map<T>(
    key_kind: Option<Kind>,
    value: impl Fn(&FieldPath, &RawNode) -> Decoded<T>,
) -> impl Fn(&FieldPath, &RawNode) -> Decoded<BTreeMap<String, T>> {
    move |path: &FieldPath, node: &RawNode| {
        let entries = match node {
            RawNode::Map(entries) => entries,
            other => return Err(wrong_type(path, "a mapping", other)),
        };
        let mut errors = ConfigErrors::new();
        let mut values = BTreeMap::new();
        for (key, raw) in entries {
            let entry_path = path.key(key.as_str());
            if let Some(kind) = key_kind {
                if let Err(e) = validate_text(kind, key) {
                    errors.push(ConfigError::primitive(entry_path, &e));
                    continue;
                }
            }
            if let Some(decoded) = errors.absorb(value(&entry_path, raw)) {
                values.insert(key.clone(), decoded);
            }
        }
        errors.into_result(values)
    }
}

/// Mapping passed through untouched
pub(crate) fn mapping(path: &FieldPath, node: &RawNode) -> Decoded<RawNode> {
    match node {
        RawNode::Map(_) => Ok(node.clone()),
        other => Err(wrong_type(path, "a mapping", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::ErrorKind;
    use portico_types::StopMethod;

    fn path() -> FieldPath {
        FieldPath::of("field")
    }

    fn first_kind(errors: ConfigErrors) -> ErrorKind {
        errors.iter().next().map(|e| e.kind).unwrap()
    }

    #[test]
    fn test_port_accepts_int_and_string() {
        assert_eq!(port(&path(), &RawNode::Int(8080)).unwrap().get(), 8080);
        assert_eq!(port(&path(), &RawNode::from("443")).unwrap().get(), 443);
        assert_eq!(
            first_kind(port(&path(), &RawNode::Int(65536)).unwrap_err()),
            ErrorKind::RangeViolation
        );
        assert_eq!(
            first_kind(port(&path(), &RawNode::Bool(true)).unwrap_err()),
            ErrorKind::PatternMismatch
        );
    }

    #[test]
    fn test_duration_kind() {
        assert!(duration(&path(), &RawNode::from("1m30s")).is_ok());
        let errors = duration(&path(), &RawNode::from("90 seconds")).unwrap_err();
        assert_eq!(first_kind(errors.clone()), ErrorKind::PatternMismatch);
        assert!(errors.to_string().contains("duration"));
    }

    #[test]
    fn test_identity() {
        let decode = identity(&StopMethod::ALIASES);
        assert_eq!(decode(&path(), &RawNode::from("kill")).unwrap(), StopMethod::Kill);
        let errors = decode(&path(), &RawNode::from("Kill")).unwrap_err();
        assert_eq!(first_kind(errors.clone()), ErrorKind::UnknownConstruct);
        assert!(errors.to_string().contains("pause, stop, kill"));
    }

    #[test]
    fn test_list_collects_every_item_error() {
        let decode = list(cidr);
        let node = RawNode::Seq(vec![
            RawNode::from("10.0.0.0/8"),
            RawNode::from("nope"),
            RawNode::from("10.0.0.0/99"),
        ]);
        let errors = decode(&path(), &node).unwrap_err();
        let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["field[1]", "field[2]"]);
        assert_eq!(errors.count(ErrorKind::RangeViolation), 1);
    }

    #[test]
    fn test_non_empty_list() {
        let decode = non_empty_list(string);
        assert_eq!(
            first_kind(decode(&path(), &RawNode::Seq(vec![])).unwrap_err()),
            ErrorKind::RangeViolation
        );
    }

    #[test]
    fn test_string_map_validates_keys() {
        let decode = string_map(Some(Kind::HttpHeader), string);
        let node = RawNode::Map(vec![
            ("X-Forwarded-Host".to_string(), RawNode::from("a")),
            ("bad header".to_string(), RawNode::from("b")),
        ]);
        let errors = decode(&path(), &node).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().path.to_string(), "field.bad header");
    }

    #[test]
    fn test_bounded() {
        let decode = bounded(0, 100);
        assert_eq!(decode(&path(), &RawNode::Int(100)).unwrap(), 100);
        assert_eq!(
            first_kind(decode(&path(), &RawNode::Int(101)).unwrap_err()),
            ErrorKind::RangeViolation
        );
    }
}
