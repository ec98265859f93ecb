//! Completed timer intervals and their aggregation key.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot name used when a record has no category.
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

/// A durable, immutable record of one completed timer interval.
///
/// The `category_*` fields are a point-in-time copy taken when the
/// timer stopped. They are never re-joined against the live category
/// table, so later renames or deactivations leave history intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Floor of elapsed wall-clock seconds, never negative.
    pub duration_seconds: i64,
    /// Local calendar date of `end_time`, formatted `YYYY-MM-DD`.
    /// Fixed-width, so string comparison orders chronologically.
    pub date: String,
    pub category_key: Option<String>,
    pub category_name: String,
    pub category_color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A record ready to be appended to the ledger, before id assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeRecord {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
    pub date: String,
    pub category_key: Option<String>,
    pub category_name: String,
    pub category_color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Formats the aggregation key for an instant: its local calendar date
/// as `YYYY-MM-DD`.
///
/// Instants stay UTC everywhere else; only this derived key consults
/// the local offset, matching how users think of "today".
pub fn local_date_key(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%Y-%m-%d").to_string()
}
