//! Retention-based pruning
//!
//! Records carry a `date` (ISO-8601, date part used) and optionally a
//! `search_weight` and a `retention_days` override in their payload. The
//! weight selects a retention tier; the override can only shorten it.
//! Records without a readable date are never pruned.

use super::api::ChromaRecords;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload key holding the record date
pub const DATE_KEY: &str = "date";
/// Payload key holding the record weight
pub const WEIGHT_KEY: &str = "search_weight";
/// Payload key holding a per-record retention override
pub const RETENTION_KEY: &str = "retention_days";

/// Records weighing at least `min_weight` are kept for `days`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetentionTier {
    /// Lowest weight the tier applies to
    pub min_weight: f64,
    /// Days to keep records in this tier
    pub days: i64,
}

/// Retention tiers, highest `min_weight` first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    tiers: Vec<RetentionTier>,
    /// Days to keep records no tier applies to
    pub default_days: i64,
}

impl Default for RetentionPolicy {
    /// 365 days at weight 0.8, 90 at 0.4, 30 otherwise
    fn default() -> Self {
        RetentionPolicy::new(
            vec![
                RetentionTier {
                    min_weight: 0.8,
                    days: 365,
                },
                RetentionTier {
                    min_weight: 0.4,
                    days: 90,
                },
                RetentionTier {
                    min_weight: 0.0,
                    days: 30,
                },
            ],
            30,
        )
    }
}

impl RetentionPolicy {
    /// Policy from tiers in any order
    pub fn new(mut tiers: Vec<RetentionTier>, default_days: i64) -> Self {
        tiers.sort_by(|a, b| b.min_weight.total_cmp(&a.min_weight));
        RetentionPolicy {
            tiers,
            default_days,
        }
    }

    /// Tiers, highest `min_weight` first
    pub fn tiers(&self) -> &[RetentionTier] {
        &self.tiers
    }

    /// Days a record is kept
    pub fn max_age_days(&self, weight: f64, override_days: Option<i64>) -> i64 {
        let days = self
            .tiers
            .iter()
            .find(|tier| weight >= tier.min_weight)
            .map_or(self.default_days, |tier| tier.days);
        override_days.map_or(days, |o| days.min(o))
    }

    /// Whether a record with this metadata has expired on `today`
    pub fn is_expired(&self, metadata: &Map<String, Value>, today: NaiveDate) -> bool {
        let Some(date) = metadata.get(DATE_KEY).and_then(record_date) else {
            return false;
        };
        let weight = metadata
            .get(WEIGHT_KEY)
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let override_days = metadata.get(RETENTION_KEY).and_then(whole_days);
        (today - date).num_days() > self.max_age_days(weight, override_days)
    }
}

fn record_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?;
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn whole_days(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Ids of expired records
pub fn expired_ids(records: &ChromaRecords, policy: &RetentionPolicy, today: NaiveDate) -> Vec<String> {
    let Some(metadatas) = &records.metadatas else {
        return Vec::new();
    };
    records
        .ids
        .iter()
        .zip(metadatas)
        .filter_map(|(id, metadata)| {
            let metadata = metadata.as_ref()?;
            policy.is_expired(metadata, today).then(|| id.clone())
        })
        .collect()
}
