use serde_json::Value as Json;

use logscope_types::{KvMap, LogBatch, Value};

use crate::error::SkipReason;

/// Parse one decompressed chunk into a log batch.
///
/// Missing or null levels decode as empty; unknown fields are ignored. A
/// document that is not JSON, or whose containers have the wrong shape, is an
/// error for the whole batch.
pub fn decode_batch(bytes: &[u8]) -> Result<LogBatch, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Flatten a `{"values": [{"key": .., "value": {..}}, ..]}` node.
///
/// String values become [`Value::Str`], `kvlistValue` nodes are flattened
/// recursively into [`Value::Nested`]. Values of any other OTLP type are
/// ignored. Later keys overwrite earlier ones.
pub fn flatten_kvlist(node: &Json) -> Result<KvMap, SkipReason> {
    let node = node
        .as_object()
        .ok_or_else(|| SkipReason::MalformedKeyValue("list node is not an object".to_string()))?;

    match node.get("values") {
        None | Some(Json::Null) => Ok(KvMap::new()),
        Some(Json::Array(entries)) => flatten_entries(entries),
        Some(_) => Err(SkipReason::MalformedKeyValue(
            "'values' is not an array".to_string(),
        )),
    }
}

/// Flatten a bare list of key/value entries, such as a record's attributes
pub fn flatten_entries(entries: &[Json]) -> Result<KvMap, SkipReason> {
    let mut map = KvMap::new();

    for entry in entries {
        let key = entry
            .get("key")
            .and_then(Json::as_str)
            .ok_or_else(|| SkipReason::MalformedKeyValue(format!("entry without key: {}", entry)))?;

        if let Some(value) = entry.get("value").map(any_value).transpose()?.flatten() {
            map.insert(key.to_string(), value);
        }
    }

    Ok(map)
}

/// Convert an OTLP `AnyValue`; `None` for types that are not carried
fn any_value(value: &Json) -> Result<Option<Value>, SkipReason> {
    if let Some(s) = value.get("stringValue") {
        return s
            .as_str()
            .map(|s| Some(Value::Str(s.to_string())))
            .ok_or_else(|| SkipReason::MalformedKeyValue(format!("non-string stringValue: {}", s)));
    }

    if let Some(list) = value.get("kvlistValue") {
        return flatten_kvlist(list).map(|map| Some(Value::Nested(map)));
    }

    Ok(None)
}
