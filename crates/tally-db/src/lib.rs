//! SQLite storage for the tally time tracker.
//!
//! Provides the category store (with logical delete) and the
//! append-only time record ledger, and implements the storage traits
//! that `tally-core` defines for the timer controller.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`: an instance can move between threads but needs external
//! synchronization to be shared.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 form with millisecond
//! precision and a `Z` suffix, so lexicographic order matches
//! chronological order. The `date` column is the record's local
//! calendar end date as fixed-width `YYYY-MM-DD`; range queries
//! compare it as a string, which is valid because of the zero-padded
//! format. `time_records` is append-only: no UPDATE or DELETE is ever
//! issued against it.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use tally_core::{
    Category, CategoryLookup, CategoryPatch, Error, NewCategory, NewTimeRecord, RecordLedger,
    TimeRecord,
};

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), Error> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                color TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            -- Ledger of completed timer intervals. The category_*
            -- columns are a snapshot taken at stop time, not a join
            -- against the categories table.
            CREATE TABLE IF NOT EXISTS time_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                date TEXT NOT NULL,
                category_key TEXT,
                category_name TEXT NOT NULL,
                category_color TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_time_records_date ON time_records(date);
            ",
        )?;
        Ok(())
    }

    // ========== Category store ==========

    /// Creates a category with `is_active = true`.
    ///
    /// Fails with [`Error::Conflict`] when the key is already taken,
    /// whether the existing category is active or deactivated.
    pub fn create_category(&self, category: &NewCategory) -> Result<Category, Error> {
        if self.category_by_key(&category.key)?.is_some() {
            return Err(Error::Conflict(format!(
                "category with key '{}' already exists",
                category.key
            )));
        }
        self.conn.execute(
            "INSERT INTO categories (key, name, color, is_active) VALUES (?, ?, ?, 1)",
            params![category.key, category.name, category.color],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, key = %category.key, "category created");
        Ok(Category {
            id,
            key: category.key.clone(),
            name: category.name.clone(),
            color: category.color.clone(),
            is_active: true,
        })
    }

    /// Lists categories in insertion order, optionally only active ones.
    pub fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, Error> {
        let sql = if active_only {
            "SELECT id, key, name, color, is_active FROM categories WHERE is_active = 1 ORDER BY id ASC"
        } else {
            "SELECT id, key, name, color, is_active FROM categories ORDER BY id ASC"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], category_from_row)?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    /// Point lookup by unique key, active or not.
    pub fn category_by_key(&self, key: &str) -> Result<Option<Category>, Error> {
        let category = self
            .conn
            .query_row(
                "SELECT id, key, name, color, is_active FROM categories WHERE key = ?",
                [key],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// Point lookup by id, active or not.
    pub fn category_by_id(&self, id: i64) -> Result<Option<Category>, Error> {
        let category = self
            .conn
            .query_row(
                "SELECT id, key, name, color, is_active FROM categories WHERE id = ?",
                [id],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// Applies a partial update and returns the stored result.
    ///
    /// Absent patch fields leave their columns untouched; a provided
    /// `color: Some(None)` clears the color.
    pub fn update_category(&self, id: i64, patch: &CategoryPatch) -> Result<Category, Error> {
        let Some(mut category) = self.category_by_id(id)? else {
            return Err(Error::NotFound(format!("category {id} not found")));
        };
        if let Some(name) = &patch.name {
            category.name.clone_from(name);
        }
        if let Some(color) = &patch.color {
            category.color.clone_from(color);
        }
        if let Some(is_active) = patch.is_active {
            category.is_active = is_active;
        }
        self.conn.execute(
            "UPDATE categories SET name = ?, color = ?, is_active = ? WHERE id = ?",
            params![category.name, category.color, category.is_active, id],
        )?;
        Ok(category)
    }

    /// Logical delete: marks the category inactive, keeping the row.
    ///
    /// Deactivating an already-inactive category is not an error.
    pub fn deactivate_category(&self, id: i64) -> Result<(), Error> {
        let changed = self
            .conn
            .execute("UPDATE categories SET is_active = 0 WHERE id = ?", [id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("category {id} not found")));
        }
        tracing::debug!(id, "category deactivated");
        Ok(())
    }

    // ========== Time record ledger ==========

    /// Appends one completed interval and returns it with its id.
    pub fn append_record(&self, record: &NewTimeRecord) -> Result<TimeRecord, Error> {
        self.conn.execute(
            "
            INSERT INTO time_records
            (start_time, end_time, duration_seconds, date, category_key, category_name, category_color, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                format_timestamp(record.start_time),
                format_timestamp(record.end_time),
                record.duration_seconds,
                record.date,
                record.category_key,
                record.category_name,
                record.category_color,
                format_timestamp(record.created_at),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, date = %record.date, "record appended");
        Ok(TimeRecord {
            id,
            start_time: record.start_time,
            end_time: record.end_time,
            duration_seconds: record.duration_seconds,
            date: record.date.clone(),
            category_key: record.category_key.clone(),
            category_name: record.category_name.clone(),
            category_color: record.category_color.clone(),
            created_at: record.created_at,
        })
    }

    /// Records whose `date` equals the given key, in insertion order.
    pub fn records_for_date(&self, date: &str) -> Result<Vec<TimeRecord>, Error> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, start_time, end_time, duration_seconds, date,
                   category_key, category_name, category_color, created_at
            FROM time_records
            WHERE date = ?
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([date], raw_record_from_row)?;
        collect_records(rows)
    }

    /// Records with `start_date <= date <= end_date`, both ends inclusive.
    pub fn records_in_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<TimeRecord>, Error> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, start_time, end_time, duration_seconds, date,
                   category_key, category_name, category_color, created_at
            FROM time_records
            WHERE date >= ? AND date <= ?
            ORDER BY date ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([start_date, end_date], raw_record_from_row)?;
        collect_records(rows)
    }
}

impl CategoryLookup for Database {
    fn category_by_key(&self, key: &str) -> Result<Option<Category>, Error> {
        Self::category_by_key(self, key)
    }
}

impl RecordLedger for Database {
    fn append(&self, record: NewTimeRecord) -> Result<TimeRecord, Error> {
        self.append_record(&record)
    }
}

fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        key: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        is_active: row.get(4)?,
    })
}

/// Row shape before timestamp parsing.
struct RawRecord {
    id: i64,
    start_time: String,
    end_time: String,
    duration_seconds: i64,
    date: String,
    category_key: Option<String>,
    category_name: String,
    category_color: Option<String>,
    created_at: String,
}

fn raw_record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get(0)?,
        start_time: row.get(1)?,
        end_time: row.get(2)?,
        duration_seconds: row.get(3)?,
        date: row.get(4)?,
        category_key: row.get(5)?,
        category_name: row.get(6)?,
        category_color: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn collect_records(
    rows: impl Iterator<Item = rusqlite::Result<RawRecord>>,
) -> Result<Vec<TimeRecord>, Error> {
    let mut records = Vec::new();
    for row in rows {
        let raw = row?;
        records.push(TimeRecord {
            id: raw.id,
            start_time: parse_timestamp(&raw.start_time)?,
            end_time: parse_timestamp(&raw.end_time)?,
            duration_seconds: raw.duration_seconds,
            date: raw.date,
            category_key: raw.category_key,
            category_name: raw.category_name,
            category_color: raw.category_color,
            created_at: parse_timestamp(&raw.created_at)?,
        });
    }
    Ok(records)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(Error::storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_category(key: &str, name: &str, color: Option<&str>) -> NewCategory {
        NewCategory {
            key: key.to_string(),
            name: name.to_string(),
            color: color.map(str::to_string),
        }
    }

    fn new_record(date: &str, name: &str, duration_seconds: i64) -> NewTimeRecord {
        let end_time: DateTime<Utc> = format!("{date}T10:00:00Z").parse().unwrap();
        NewTimeRecord {
            start_time: end_time - chrono::Duration::seconds(duration_seconds),
            end_time,
            duration_seconds,
            date: date.to_string(),
            category_key: None,
            category_name: name.to_string(),
            category_color: None,
            created_at: end_time,
        }
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn init_is_idempotent_on_disk() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tally.db");
        drop(Database::open(&path).unwrap());
        let db = Database::open(&path).unwrap();
        assert!(db.list_categories(false).unwrap().is_empty());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        let categories_columns = table_columns(&db.conn, "categories");
        assert_eq!(
            categories_columns,
            vec!["id", "key", "name", "color", "is_active"]
        );

        let records_columns = table_columns(&db.conn, "time_records");
        assert_eq!(
            records_columns,
            vec![
                "id",
                "start_time",
                "end_time",
                "duration_seconds",
                "date",
                "category_key",
                "category_name",
                "category_color",
                "created_at",
            ]
        );

        let record_indexes = index_names(&db.conn, "time_records");
        assert!(record_indexes.contains(&"idx_time_records_date".to_string()));
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn create_category_assigns_id_and_defaults_active() {
        let db = Database::open_in_memory().unwrap();
        let category = db
            .create_category(&new_category("work", "Work", Some("#f00")))
            .unwrap();

        assert!(category.id > 0);
        assert!(category.is_active);
        assert_eq!(
            db.category_by_key("work").unwrap().as_ref(),
            Some(&category)
        );
        assert_eq!(
            db.category_by_id(category.id).unwrap().as_ref(),
            Some(&category)
        );
    }

    #[test]
    fn create_category_conflicts_on_duplicate_key() {
        let db = Database::open_in_memory().unwrap();
        db.create_category(&new_category("work", "Work", None))
            .unwrap();

        let err = db
            .create_category(&new_category("work", "Other", None))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn create_category_conflicts_even_when_existing_is_deactivated() {
        let db = Database::open_in_memory().unwrap();
        let category = db.create_category(&new_category("work", "Work", None)).unwrap();
        db.deactivate_category(category.id).unwrap();

        let err = db
            .create_category(&new_category("work", "Work Again", None))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn list_categories_filters_and_keeps_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        let work = db.create_category(&new_category("work", "Work", None)).unwrap();
        let rest = db.create_category(&new_category("rest", "Rest", None)).unwrap();
        db.deactivate_category(rest.id).unwrap();

        let active = db.list_categories(true).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].key, "work");

        let all = db.list_categories(false).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, work.id);
        assert_eq!(all[1].id, rest.id);
        assert!(!all[1].is_active);
    }

    #[test]
    fn update_category_applies_only_provided_fields() {
        let db = Database::open_in_memory().unwrap();
        let category = db
            .create_category(&new_category("work", "Work", Some("#f00")))
            .unwrap();

        let updated = db
            .update_category(
                category.id,
                &CategoryPatch {
                    name: Some("Deep Work".to_string()),
                    ..CategoryPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Deep Work");
        assert_eq!(updated.color.as_deref(), Some("#f00"));
        assert!(updated.is_active);
    }

    #[test]
    fn update_category_honors_explicit_color_clear() {
        let db = Database::open_in_memory().unwrap();
        let category = db
            .create_category(&new_category("work", "Work", Some("#f00")))
            .unwrap();

        let updated = db
            .update_category(
                category.id,
                &CategoryPatch {
                    color: Some(None),
                    ..CategoryPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.color, None);
        assert_eq!(db.category_by_id(category.id).unwrap().unwrap().color, None);
    }

    #[test]
    fn update_category_missing_id_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_category(99, &CategoryPatch::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn deactivate_category_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let category = db.create_category(&new_category("work", "Work", None)).unwrap();

        db.deactivate_category(category.id).unwrap();
        db.deactivate_category(category.id).unwrap();
        assert!(!db.category_by_id(category.id).unwrap().unwrap().is_active);
    }

    #[test]
    fn deactivate_category_missing_id_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.deactivate_category(99).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn append_record_round_trips_timestamps() {
        let db = Database::open_in_memory().unwrap();
        let record = db.append_record(&new_record("2025-03-07", "Work", 90)).unwrap();

        assert!(record.id > 0);
        let fetched = db.records_for_date("2025-03-07").unwrap();
        assert_eq!(fetched, vec![record]);
    }

    #[test]
    fn records_for_date_matches_equality_only() {
        let db = Database::open_in_memory().unwrap();
        db.append_record(&new_record("2025-03-07", "Work", 90)).unwrap();
        db.append_record(&new_record("2025-03-08", "Work", 30)).unwrap();

        let records = db.records_for_date("2025-03-07").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration_seconds, 90);
    }

    #[test]
    fn records_in_range_is_inclusive_on_both_ends() {
        let db = Database::open_in_memory().unwrap();
        db.append_record(&new_record("2025-03-06", "Work", 10)).unwrap();
        db.append_record(&new_record("2025-03-07", "Work", 20)).unwrap();
        db.append_record(&new_record("2025-03-08", "Rest", 30)).unwrap();
        db.append_record(&new_record("2025-03-09", "Rest", 40)).unwrap();

        let records = db.records_in_range("2025-03-07", "2025-03-08").unwrap();
        let dates: Vec<&str> = records.iter().map(|record| record.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-03-07", "2025-03-08"]);
    }

    #[test]
    fn record_snapshot_survives_category_edits() {
        let db = Database::open_in_memory().unwrap();
        let category = db
            .create_category(&new_category("work", "Work", Some("#f00")))
            .unwrap();

        let mut record = new_record("2025-03-07", "Work", 60);
        record.category_key = Some("work".to_string());
        record.category_color = Some("#f00".to_string());
        let stored = db.append_record(&record).unwrap();

        db.update_category(
            category.id,
            &CategoryPatch {
                name: Some("Renamed".to_string()),
                color: Some(None),
                ..CategoryPatch::default()
            },
        )
        .unwrap();
        db.deactivate_category(category.id).unwrap();

        let fetched = db.records_for_date("2025-03-07").unwrap();
        assert_eq!(fetched, vec![stored.clone()]);
        assert_eq!(fetched[0].category_name, "Work");
        assert_eq!(fetched[0].category_color.as_deref(), Some("#f00"));
    }
}
