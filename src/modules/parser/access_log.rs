//! Access log decoding: filters and field redaction policies

use portico_core::{
    AccessLog, AccessLogFields, AccessLogFilters, ConfigError, ConfigErrors, FieldPath,
    FieldPolicy, LogFilter, RawNode,
};
use portico_types::{validate_text, AccessLogFormat, FieldMode, HttpMethod, Kind};

use crate::defaults;
use crate::record::Record;
use crate::scalar::{
    bounded, boolean, cidr, identity, kind, list, status_code_range, string, string_map,
};

pub(crate) fn decode_access_log(path: &FieldPath, node: &RawNode) -> Result<AccessLog, ConfigErrors> {
    let mut rec = Record::new(node, path, "access log")?;
    let buffer_size = rec.optional("buffer_size", bounded(0, i64::MAX));
    let format = rec.optional("format", identity(&AccessLogFormat::ALIASES));
    let log_path = rec.required("path", kind(Kind::Uri));
    let filters = rec.optional("filters", decode_filters);
    let fields = rec.optional("fields", decode_fields);

    rec.build(|| {
        Some(AccessLog {
            buffer_size: buffer_size.map(|n| n as u64).unwrap_or(defaults::ACCESS_LOG_BUFFER_SIZE),
            format: format.unwrap_or(defaults::ACCESS_LOG_FORMAT),
            path: log_path?,
            filters: filters.unwrap_or_default(),
            fields: fields.unwrap_or_default(),
        })
    })
}

fn decode_filters(path: &FieldPath, node: &RawNode) -> Result<AccessLogFilters, ConfigErrors> {
    let mut rec = Record::new(node, path, "access log filters")?;
    let status_codes = rec.optional_any(&["status_codes", "status_code"], |path, node| {
        filter(path, node, status_code_range)
    });
    let method = rec.optional("method", |path, node| {
        filter(path, node, identity(&HttpMethod::ALIASES))
    });
    let host = rec.optional("host", |path, node| filter(path, node, string));
    let headers = rec.optional("headers", |path, node| filter(path, node, header_filter));
    let cidr = rec.optional("cidr", |path, node| filter(path, node, cidr));

    rec.build(|| {
        Some(AccessLogFilters {
            status_codes,
            method,
            host,
            headers,
            cidr,
        })
    })
}

fn filter<T>(
    path: &FieldPath,
    node: &RawNode,
    value: impl Fn(&FieldPath, &RawNode) -> Result<T, ConfigErrors>,
) -> Result<LogFilter<T>, ConfigErrors> {
    let mut rec = Record::new(node, path, "access log filter")?;
    let negative = rec.optional("negative", boolean);
    let values = rec.required("values", list(value));
    rec.build(|| {
        Some(LogFilter {
            negative: negative.unwrap_or(false),
            values: values?,
        })
    })
}

/// `Name` or `Name=value`; the name must be a legal header name
fn header_filter(path: &FieldPath, node: &RawNode) -> Result<String, ConfigErrors> {
    let raw = string(path, node)?;
    let name = raw.split_once('=').map(|(name, _)| name).unwrap_or(&raw);
    validate_text(Kind::HttpHeader, name)
        .map_err(|e| ConfigError::primitive(path.clone(), &e))?;
    Ok(raw)
}

fn decode_fields(path: &FieldPath, node: &RawNode) -> Result<AccessLogFields, ConfigErrors> {
    let mut rec = Record::new(node, path, "access log fields")?;
    let header = rec.optional_any(&["header", "headers"], policy);
    let query = rec.optional("query", policy);
    let cookie = rec.optional("cookie", policy);
    rec.build(|| Some(AccessLogFields { header, query, cookie }))
}

/// Field keys are checked against header/query/cookie syntax during invariant checking
fn policy(path: &FieldPath, node: &RawNode) -> Result<FieldPolicy, ConfigErrors> {
    let mut rec = Record::new_or_empty(node, path, "field policy")?;
    let default = rec.optional("default", identity(&FieldMode::ALIASES));
    let config = rec.optional("config", string_map(None, identity(&FieldMode::ALIASES)));
    rec.build(|| {
        Some(FieldPolicy {
            default: default.unwrap_or(defaults::FIELD_MODE),
            config: config.unwrap_or_default(),
        })
    })
}
