//! Read-side aggregation over recorded time.
//!
//! These functions are pure: the caller fetches records from the
//! ledger (equality or inclusive range scan on the `date` key) and
//! the aggregator folds them into totals and breakdowns. Breakdowns
//! use the stored category snapshots, never the live category table.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::record::{TimeRecord, UNCATEGORIZED_NAME};

/// An ordered key → seconds accumulation.
///
/// Keys keep first-seen order, which a `HashMap` or `BTreeMap` would
/// lose; serialization still produces a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakdown(Vec<(String, i64)>);

impl Breakdown {
    fn add(&mut self, key: &str, seconds: i64) {
        match self.0.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, total)) => *total += seconds,
            None => self.0.push((key.to_string(), seconds)),
        }
    }

    /// Returns the summed seconds for a key, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, seconds)| *seconds)
    }

    /// Iterates entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(key, seconds)| (key.as_str(), *seconds))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Breakdown {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, seconds) in &self.0 {
            map.serialize_entry(key, seconds)?;
        }
        map.end()
    }
}

/// Aggregate for a single calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: String,
    pub total_seconds: i64,
    pub total_minutes: f64,
    pub total_hours: f64,
    /// Seconds per snapshot category name, first-seen order.
    pub breakdown: Breakdown,
    /// The raw matching records.
    pub records: Vec<TimeRecord>,
}

/// Aggregate over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeStats {
    pub start_date: String,
    pub end_date: String,
    pub total_seconds: i64,
    pub total_minutes: f64,
    pub total_hours: f64,
    /// Seconds per snapshot category name, first-seen order.
    pub by_category: Breakdown,
    /// Seconds per date present in the result set, first-seen order.
    pub by_date: Breakdown,
}

/// Aggregates records whose `date` equals the given key.
#[must_use]
pub fn daily(date: &str, records: Vec<TimeRecord>) -> DailyStats {
    let mut total_seconds = 0;
    let mut breakdown = Breakdown::default();
    for record in &records {
        total_seconds += record.duration_seconds;
        breakdown.add(snapshot_name(record), record.duration_seconds);
    }
    DailyStats {
        date: date.to_string(),
        total_seconds,
        total_minutes: round2(seconds_to_minutes(total_seconds)),
        total_hours: round2(seconds_to_hours(total_seconds)),
        breakdown,
        records,
    }
}

/// Aggregates records from an inclusive `[start_date, end_date]` scan.
#[must_use]
pub fn range(start_date: &str, end_date: &str, records: &[TimeRecord]) -> RangeStats {
    let mut total_seconds = 0;
    let mut by_category = Breakdown::default();
    let mut by_date = Breakdown::default();
    for record in records {
        total_seconds += record.duration_seconds;
        by_category.add(snapshot_name(record), record.duration_seconds);
        by_date.add(&record.date, record.duration_seconds);
    }
    RangeStats {
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        total_seconds,
        total_minutes: round2(seconds_to_minutes(total_seconds)),
        total_hours: round2(seconds_to_hours(total_seconds)),
        by_category,
        by_date,
    }
}

/// An empty stored name falls back to the uncategorized label.
fn snapshot_name(record: &TimeRecord) -> &str {
    if record.category_name.is_empty() {
        UNCATEGORIZED_NAME
    } else {
        &record.category_name
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "durations are far below 2^52 seconds"
)]
fn seconds_to_minutes(seconds: i64) -> f64 {
    seconds as f64 / 60.0
}

#[expect(
    clippy::cast_precision_loss,
    reason = "durations are far below 2^52 seconds"
)]
fn seconds_to_hours(seconds: i64) -> f64 {
    seconds as f64 / 3600.0
}

/// Rounds half away from zero to two decimal places. Both queries use
/// this, so `daily` and `range` cannot disagree on rounding.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
