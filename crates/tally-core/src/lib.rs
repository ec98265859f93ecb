//! Core domain logic for the tally time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Categories: named tags with logical delete and key normalization
//! - Timer control: the single-session Idle/Running state machine
//! - Records: immutable snapshots of completed timer intervals
//! - Statistics: daily and ranged aggregation over recorded time
//!
//! Persistence lives behind the [`CategoryLookup`] and [`RecordLedger`]
//! traits, implemented by the `tally-db` crate.

pub mod category;
mod error;
pub mod record;
pub mod stats;
mod store;
pub mod timer;

pub use category::{Category, CategoryPatch, NewCategory, UNCATEGORIZED_KEY, normalize_category_key};
pub use error::Error;
pub use record::{NewTimeRecord, TimeRecord, UNCATEGORIZED_NAME, local_date_key};
pub use stats::{Breakdown, DailyStats, RangeStats, daily, range};
pub use store::{CategoryLookup, RecordLedger};
pub use timer::{TimerController, TimerSession};
