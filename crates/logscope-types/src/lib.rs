//! Shared types for logscope
//!
//! This crate contains data structures used across multiple logscope crates.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Batch Types
// ============================================================================

/// One log-export batch, the JSON document held by a single chunk
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_logs: Vec<ResourceLogs>,
}

impl LogBatch {
    /// Iterate all log records in decode order
    /// (resource logs, then scope logs, then records)
    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.resource_logs
            .iter()
            .flat_map(|r| r.scope_logs.iter())
            .flat_map(|s| s.log_records.iter())
    }

    /// Total number of log records in the batch
    pub fn record_count(&self) -> usize {
        self.records().count()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLogs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope_logs: Vec<ScopeLogs>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeLogs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_records: Vec<LogRecord>,
}

/// A single log record as exported
///
/// `body`, `attributes` and `timeUnixNano` stay as raw JSON so that an oddly
/// shaped record can be skipped on its own instead of failing the whole batch.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Nanoseconds since the epoch; carried through but not used for output
    #[serde(default)]
    pub time_unix_nano: serde_json::Value,

    #[serde(default)]
    pub body: serde_json::Value,

    /// Expected to be an array of key/value entries
    #[serde(default)]
    pub attributes: serde_json::Value,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Flattened Values
// ============================================================================

/// Flattened key/value list
pub type KvMap = HashMap<String, Value>;

/// A flattened attribute value: either a string leaf or a nested list
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Nested(KvMap),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Nested(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&KvMap> {
        match self {
            Self::Str(_) => None,
            Self::Nested(map) => Some(map),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<KvMap> for Value {
    fn from(map: KvMap) -> Self {
        Self::Nested(map)
    }
}

// ============================================================================
// Record Types
// ============================================================================

/// Namespace, pod and container a record belongs to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Workload {
    pub namespace: String,
    pub pod: String,
    pub container: String,
}

impl Workload {
    pub fn new(namespace: &str, pod: &str, container: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            container: container.to_string(),
        }
    }
}

/// Fields extracted from one log record, ready for filtering and output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub workload: Workload,

    pub message: String,

    /// Record timestamp, if the extraction strategy produced one
    pub timestamp: Option<DateTime<Utc>>,
}

impl ExtractedRecord {
    pub fn new(workload: Workload, message: String) -> Self {
        Self {
            workload,
            message,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.workload.namespace
    }

    pub fn pod(&self) -> &str {
        &self.workload.pod
    }

    pub fn container(&self) -> &str {
        &self.workload.container
    }

    /// Timestamp in RFC 3339 form (UTC, `Z` suffix)
    pub fn timestamp_rfc3339(&self) -> Option<String> {
        self.timestamp
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

// ============================================================================
// Run Configuration
// ============================================================================

/// Record selection criteria, fixed for the whole run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchCriteria {
    /// Namespace prefix (empty = all)
    pub namespace: String,

    /// Pod prefix (empty = all)
    pub pod: String,

    /// Container prefix (empty = all)
    pub container: String,

    /// Only records newer than now minus this duration (None or zero = all)
    pub since: Option<Duration>,
}

impl MatchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>) -> Self {
        self.namespace = prefix.into();
        self
    }

    pub fn with_pod(mut self, prefix: impl Into<String>) -> Self {
        self.pod = prefix.into();
        self
    }

    pub fn with_container(mut self, prefix: impl Into<String>) -> Self {
        self.container = prefix.into();
        self
    }

    pub fn with_since(mut self, since: Option<Duration>) -> Self {
        self.since = since;
        self
    }

    /// Active time window, if any
    pub fn window(&self) -> Option<Duration> {
        self.since.filter(|d| !d.is_zero())
    }

    /// Check if the criteria select every record
    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty()
            && self.pod.is_empty()
            && self.container.is_empty()
            && self.window().is_none()
    }
}

/// Which record encoding to extract fields from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Pick per record by body shape
    #[default]
    Auto,
    /// String body plus `fluent.tag` / `time` attributes
    Attributes,
    /// Key/value-list body with `log` and `kubernetes` keys
    Kubernetes,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Attributes => "attributes",
            Self::Kubernetes => "kubernetes",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "attributes" | "attrs" | "tag" => Ok(Self::Attributes),
            "kubernetes" | "k8s" | "kvlist" => Ok(Self::Kubernetes),
            other => Err(format!(
                "unknown strategy '{}' (expected auto, attributes or kubernetes)",
                other
            )),
        }
    }
}

/// When a record without a usable timestamp is dropped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimePolicy {
    /// Only while a time window is active
    #[default]
    WhenFiltering,
    /// Always
    Always,
}
