use chrono::{DateTime, TimeDelta, Utc};

use logscope_types::{ExtractedRecord, MatchCriteria};

/// Match criteria resolved against a fixed point in time
#[derive(Clone, Debug)]
pub struct RecordFilter {
    criteria: MatchCriteria,

    /// Oldest timestamp that still passes (None = no time window)
    threshold: Option<DateTime<Utc>>,
}

impl RecordFilter {
    /// Create a filter whose time window ends at the current time
    pub fn new(criteria: &MatchCriteria) -> Self {
        Self::at(criteria, Utc::now())
    }

    /// Create a filter whose time window ends at `now`
    pub fn at(criteria: &MatchCriteria, now: DateTime<Utc>) -> Self {
        let threshold = criteria.window().map(|window| {
            TimeDelta::from_std(window)
                .ok()
                .and_then(|delta| now.checked_sub_signed(delta))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });

        Self {
            criteria: criteria.clone(),
            threshold,
        }
    }

    /// Check if a record passes every configured check
    pub fn matches(&self, record: &ExtractedRecord) -> bool {
        if !has_prefix(record.namespace(), &self.criteria.namespace)
            || !has_prefix(record.pod(), &self.criteria.pod)
            || !has_prefix(record.container(), &self.criteria.container)
        {
            return false;
        }

        match (self.threshold, record.timestamp) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(threshold), Some(ts)) => ts >= threshold,
        }
    }

    /// Check if the time window is active
    pub fn needs_timestamp(&self) -> bool {
        self.threshold.is_some()
    }
}

/// Empty prefix matches everything
fn has_prefix(value: &str, prefix: &str) -> bool {
    prefix.is_empty() || value.starts_with(prefix)
}
