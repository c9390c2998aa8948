use chrono::{DateTime, Utc};
use tracing::trace;

use logscope_types::{ExtractedRecord, KvMap, LogRecord, Strategy, Value, Workload};

use crate::decoder::{flatten_entries, flatten_kvlist};
use crate::error::SkipReason;
use crate::tag::parse_fluent_tag;

/// Attribute holding the fluent-bit routing tag
pub const TAG_ATTRIBUTE: &str = "fluent.tag";

/// Attribute holding the RFC 3339 record time
pub const TIME_ATTRIBUTE: &str = "time";

/// Extract output fields from a record.
///
/// With [`Strategy::Auto`] a key/value-list body selects the kubernetes
/// strategy and a string body selects the attribute strategy.
pub fn extract(record: &LogRecord, strategy: Strategy) -> Result<ExtractedRecord, SkipReason> {
    match strategy {
        Strategy::Attributes => extract_attributes(record),
        Strategy::Kubernetes => extract_kubernetes(record),
        Strategy::Auto => {
            if record.body.get("kvlistValue").is_some() {
                extract_kubernetes(record)
            } else if record.body.get("stringValue").is_some() {
                extract_attributes(record)
            } else {
                Err(SkipReason::UnsupportedBody)
            }
        }
    }
}

/// String body, workload from the `fluent.tag` attribute, time from `time`
pub fn extract_attributes(record: &LogRecord) -> Result<ExtractedRecord, SkipReason> {
    let message = match record.body.get("stringValue") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(_) => return Err(SkipReason::NotAString("body")),
        None => return Err(SkipReason::StrategyMismatch("attributes")),
    };

    let attributes = match &record.attributes {
        serde_json::Value::Array(entries) => flatten_entries(entries)?,
        serde_json::Value::Null => KvMap::new(),
        _ => return Err(SkipReason::NotAList("attributes")),
    };

    let tag = string_field(&attributes, TAG_ATTRIBUTE)?;
    let workload = parse_fluent_tag(tag)?;

    let timestamp = attributes
        .get(TIME_ATTRIBUTE)
        .and_then(Value::as_str)
        .and_then(parse_time);

    Ok(ExtractedRecord::new(workload, message).with_timestamp(timestamp))
}

/// Key/value-list body carrying `log` and a `kubernetes` map. Produces no timestamp.
pub fn extract_kubernetes(record: &LogRecord) -> Result<ExtractedRecord, SkipReason> {
    let list = record
        .body
        .get("kvlistValue")
        .ok_or(SkipReason::StrategyMismatch("kubernetes"))?;
    let body = flatten_kvlist(list)?;

    let message = string_field(&body, "log")?.to_string();

    let kubernetes = body
        .get("kubernetes")
        .ok_or(SkipReason::MissingField("kubernetes"))?
        .as_map()
        .ok_or(SkipReason::NotAList("kubernetes"))?;

    let workload = Workload::new(
        string_field(kubernetes, "namespace_name")?,
        string_field(kubernetes, "pod_name")?,
        string_field(kubernetes, "container_name")?,
    );

    Ok(ExtractedRecord::new(workload, message))
}

fn string_field<'a>(map: &'a KvMap, key: &'static str) -> Result<&'a str, SkipReason> {
    map.get(key)
        .ok_or(SkipReason::MissingField(key))?
        .as_str()
        .ok_or(SkipReason::NotAString(key))
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            trace!(raw, error = %e, "unparseable time attribute");
            None
        }
    }
}
