//! The single-session timer state machine.
//!
//! A [`TimerController`] owns one slot that is either empty (Idle) or
//! holds the one running [`TimerSession`]. Every transition locks the
//! slot for its whole duration and validates before committing, so
//! "at most one running session" holds under concurrent callers and a
//! failed validation never mutates state.
//!
//! Sessions are in-process only. A process restart silently loses an
//! in-flight session; only `stop` produces durable state, in the form
//! of exactly one appended [`TimeRecord`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::category::normalize_category_key;
use crate::error::Error;
use crate::record::{NewTimeRecord, TimeRecord, UNCATEGORIZED_NAME, local_date_key};
use crate::store::{CategoryLookup, RecordLedger};

/// The ephemeral record of one in-progress timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSession {
    pub start_time: DateTime<Utc>,
    /// Weak reference to a category key; may point to a category that
    /// is deactivated after the session started.
    pub category_key: Option<String>,
}

/// Owns the process-wide active-session slot.
#[derive(Debug, Default)]
pub struct TimerController {
    current: Mutex<Option<TimerSession>>,
}

impl TimerController {
    /// Creates a controller in the Idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<TimerSession>> {
        // A poisoned lock only means a panic elsewhere while the guard
        // was held; the slot itself is still a valid session-or-none.
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a timer, valid only from Idle.
    ///
    /// The key is normalized first (empty string and `"uncategorized"`
    /// mean no category), then validated: it must name an existing,
    /// active category.
    pub fn start<S: CategoryLookup>(
        &self,
        store: &S,
        category_key: Option<&str>,
    ) -> Result<TimerSession, Error> {
        self.start_at(store, category_key, Utc::now())
    }

    fn start_at<S: CategoryLookup>(
        &self,
        store: &S,
        category_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TimerSession, Error> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(Error::Conflict("timer is already running".to_string()));
        }
        let category_key = validate_category_key(store, category_key)?;
        let session = TimerSession {
            start_time: now,
            category_key,
        };
        tracing::debug!(category = session.category_key.as_deref(), "timer started");
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Returns the running session, or `None` in Idle. Pure read.
    pub fn current(&self) -> Option<TimerSession> {
        self.slot().clone()
    }

    /// Reassigns the running session's category, valid only from Running.
    ///
    /// Normalization and validation match [`TimerController::start`];
    /// `start_time` is untouched and a failed validation leaves the
    /// session's category as it was.
    pub fn update_category<S: CategoryLookup>(
        &self,
        store: &S,
        category_key: Option<&str>,
    ) -> Result<TimerSession, Error> {
        let mut slot = self.slot();
        let Some(session) = slot.as_mut() else {
            return Err(Error::Conflict("no timer is running".to_string()));
        };
        session.category_key = validate_category_key(store, category_key)?;
        tracing::debug!(category = session.category_key.as_deref(), "timer reassigned");
        Ok(session.clone())
    }

    /// Stops the running timer and appends one record to the ledger.
    ///
    /// The category snapshot is resolved at stop time: live name and
    /// color when the category row exists (active or not),
    /// `"Unknown (<key>)"` when it is physically gone, and
    /// `"Uncategorized"` for a session without a category. A missing
    /// category never fails the stop; a ledger failure does, and in
    /// that case the session stays running.
    pub fn stop<S: CategoryLookup + RecordLedger>(&self, store: &S) -> Result<TimeRecord, Error> {
        self.stop_at(store, Utc::now())
    }

    fn stop_at<S: CategoryLookup + RecordLedger>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<TimeRecord, Error> {
        let mut slot = self.slot();
        let Some(session) = slot.as_ref() else {
            return Err(Error::Conflict("no timer is running".to_string()));
        };

        let end_time = now;
        // Clamp: a backward clock step must not produce negative time.
        let duration_seconds = end_time
            .signed_duration_since(session.start_time)
            .num_seconds()
            .max(0);
        let snapshot = resolve_snapshot(store, session.category_key.as_deref())?;

        let record = store.append(NewTimeRecord {
            start_time: session.start_time,
            end_time,
            duration_seconds,
            date: local_date_key(end_time),
            category_key: snapshot.key,
            category_name: snapshot.name,
            category_color: snapshot.color,
            created_at: end_time,
        })?;
        tracing::info!(
            duration_seconds,
            date = %record.date,
            category = record.category_key.as_deref(),
            "timer stopped"
        );
        *slot = None;
        Ok(record)
    }
}

/// Normalizes and validates a key for `start`/`update_category`.
fn validate_category_key<S: CategoryLookup>(
    store: &S,
    category_key: Option<&str>,
) -> Result<Option<String>, Error> {
    let Some(key) = normalize_category_key(category_key) else {
        return Ok(None);
    };
    match store.category_by_key(&key)? {
        None => Err(Error::NotFound(format!(
            "category with key '{key}' not found"
        ))),
        Some(category) if !category.is_active => {
            Err(Error::InvalidState(format!("category '{key}' is inactive")))
        }
        Some(_) => Ok(Some(key)),
    }
}

struct Snapshot {
    key: Option<String>,
    name: String,
    color: Option<String>,
}

fn resolve_snapshot<S: CategoryLookup>(
    store: &S,
    category_key: Option<&str>,
) -> Result<Snapshot, Error> {
    let Some(key) = category_key else {
        return Ok(Snapshot {
            key: None,
            name: UNCATEGORIZED_NAME.to_string(),
            color: None,
        });
    };
    let snapshot = match store.category_by_key(key)? {
        Some(category) => Snapshot {
            key: Some(key.to_string()),
            name: category.name,
            color: category.color,
        },
        // Should not happen under logical delete, but a vanished row
        // must not fail the stop.
        None => {
            tracing::warn!(key, "category row missing at stop; recording as unknown");
            Snapshot {
                key: Some(key.to_string()),
                name: format!("Unknown ({key})"),
                color: None,
            }
        }
    };
    Ok(snapshot)
}
