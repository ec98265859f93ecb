//! Storage boundary traits.
//!
//! The timer controller validates categories and appends records
//! through these traits rather than a concrete database, keeping the
//! state machine testable without SQLite. `tally-db::Database`
//! implements both.

use crate::category::Category;
use crate::error::Error;
use crate::record::{NewTimeRecord, TimeRecord};

/// Point lookup of a category by its unique key.
pub trait CategoryLookup {
    /// Returns the category with the given key, active or not.
    fn category_by_key(&self, key: &str) -> Result<Option<Category>, Error>;
}

/// Append-only sink for completed timer intervals.
///
/// This is the ledger's entire write surface: records are created
/// exactly once and never updated or deleted.
pub trait RecordLedger {
    /// Persists the record and returns it with its assigned id.
    fn append(&self, record: NewTimeRecord) -> Result<TimeRecord, Error>;
}
