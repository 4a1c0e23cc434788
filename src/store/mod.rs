//! Record store: one row per successful submission, rating updated later.
//!
//! Higher layers depend on the [`RecordStore`] trait; [`SqliteRecordStore`]
//! is the production backend.
//!
//! Row layout:
//!
//! ```text
//! ID | SUB_ID | INPUT | <one column per pipeline stage> | RATING
//! ```
//!
//! Values are always bound as statement parameters.  Table and column
//! names cannot be bound, so they are checked with [`validate_identifier`]
//! before they reach a statement.

pub mod error;
pub mod record;
pub mod sqlite;

use async_trait::async_trait;

pub use error::StoreError;
pub use record::{OutputField, Rating, Record, RecordKey, Vote};
pub use sqlite::SqliteRecordStore;

/// Columns every record table has, besides the per-stage output columns.
pub const RESERVED_COLUMNS: [&str; 4] = ["ID", "SUB_ID", "INPUT", "RATING"];

// ---------------------------------------------------------------------------
// RecordStore trait
// ---------------------------------------------------------------------------

/// Abstraction over a record table backend.
///
/// Implementations must be safe to call concurrently from independent
/// sessions; rows are keyed by a unique `(id, sub_id)` pair so no
/// cross-session locking is needed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert `record` as a new row with `RATING = 0`.  Either the whole
    /// row is written or nothing is.
    async fn append(&self, record: &Record) -> Result<(), StoreError>;

    /// Set `RATING` on the row matching both ids.
    ///
    /// Returns [`StoreError::NotFound`] when no row matches.
    async fn update_rating(&self, key: &RecordKey, vote: Vote) -> Result<(), StoreError>;

    /// Read a row back.
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, StoreError>;
}

// Compile-time assertion: Box<dyn RecordStore> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn RecordStore>) {}
};

/// Accept `[A-Za-z_][A-Za-z0-9_]*`, at most 128 characters.
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= 128 {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MemoryRecordStore (test double)
// ---------------------------------------------------------------------------

/// In-memory store that counts calls and can be told to fail.
#[cfg(test)]
pub struct MemoryRecordStore {
    rows: std::sync::Mutex<std::collections::HashMap<RecordKey, Record>>,
    appends: std::sync::atomic::AtomicUsize,
    updates: std::sync::atomic::AtomicUsize,
    fail_with: std::sync::Mutex<Option<StoreError>>,
}

#[cfg(test)]
impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            rows: Default::default(),
            appends: Default::default(),
            updates: Default::default(),
            fail_with: std::sync::Mutex::new(None),
        }
    }

    /// Make every following call fail with `err` (`None` to recover).
    pub fn set_failure(&self, err: Option<StoreError>) {
        *self.fail_with.lock().unwrap() = err;
    }

    pub fn append_calls(&self) -> usize {
        self.appends.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<Record> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn append(&self, record: &Record) -> Result<(), StoreError> {
        self.appends.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.check_failure()?;

        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&record.key) {
            return Err(StoreError::Write("duplicate key".into()));
        }
        let mut row = record.clone();
        row.rating = Rating::Unrated;
        rows.insert(record.key.clone(), row);
        Ok(())
    }

    async fn update_rating(&self, key: &RecordKey, vote: Vote) -> Result<(), StoreError> {
        self.updates.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.check_failure()?;

        match self.rows.lock().unwrap().get_mut(key) {
            Some(row) => {
                row.rating = vote.into();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                id: key.id.clone(),
                sub_id: key.sub_id.clone(),
            }),
        }
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        Ok(self.rows.lock().unwrap().get(key).cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["RECORDS", "summary_records", "_t1", "T"] {
            assert!(validate_identifier(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_anything_else() {
        let long = "a".repeat(129);
        for name in ["", "1abc", "a b", "a;b", "a.b", "a\"b", "名前", long.as_str()] {
            assert!(
                matches!(validate_identifier(name), Err(StoreError::InvalidIdentifier(_))),
                "{name}"
            );
        }
    }
}
