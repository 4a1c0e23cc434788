//! [`SqliteRecordStore`]: the SQLite implementation of [`RecordStore`].

use std::path::Path;

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::OptionalExtension as _;

use super::error::{Result, StoreError};
use super::record::{OutputField, Rating, Record, RecordKey, Vote};
use super::{validate_identifier, RecordStore};

/// Record table backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and all
/// statements run on `tokio_rusqlite`'s dedicated thread, one at a time.
#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: tokio_rusqlite::Connection,
    table: String,
    columns: Vec<String>,
}

impl SqliteRecordStore {
    /// Open (or create) the store at `path` and make sure `table` exists
    /// with one text column per entry of `columns`.
    pub async fn open(path: impl AsRef<Path>, table: &str, columns: &[String]) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Connection(e.to_string()))?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::init(conn, table, columns).await
    }

    /// Open an in-memory store (used by tests).
    pub async fn open_in_memory(table: &str, columns: &[String]) -> Result<Self> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::init(conn, table, columns).await
    }

    async fn init(conn: tokio_rusqlite::Connection, table: &str, columns: &[String]) -> Result<Self> {
        validate_identifier(table)?;
        for column in columns {
            validate_identifier(column)?;
        }

        let store = Self {
            conn,
            table: table.to_string(),
            columns: columns.to_vec(),
        };

        let ddl = store.create_table_sql();
        store
            .conn
            .call(move |conn| {
                conn.execute_batch(&ddl)?;
                Ok(())
            })
            .await
            .map_err(StoreError::write)?;

        store.check_columns().await?;

        log::debug!("store: table {} ready", store.table);
        Ok(store)
    }

    /// An existing table must have exactly the configured columns, or every
    /// later insert would fail.
    async fn check_columns(&self) -> Result<()> {
        let pragma = format!("PRAGMA table_info({})", self.table);
        let mut found: Vec<String> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&pragma)?;
                let names = stmt
                    .query_map([], |r| r.get::<_, String>(1))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(names)
            })
            .await
            .map_err(StoreError::read)?;

        let mut expected = vec!["ID".to_string(), "SUB_ID".to_string(), "INPUT".to_string()];
        expected.extend(self.columns.iter().cloned());
        expected.push("RATING".to_string());

        for names in [&mut found, &mut expected] {
            names.iter_mut().for_each(|n| *n = n.to_ascii_uppercase());
            names.sort();
        }

        if found != expected {
            return Err(StoreError::Connection(format!(
                "table {} has columns [{}] but the configured stages need [{}]",
                self.table,
                found.join(", "),
                expected.join(", ")
            )));
        }
        Ok(())
    }

    fn create_table_sql(&self) -> String {
        let mut columns = vec![
            "ID TEXT NOT NULL".to_string(),
            "SUB_ID TEXT NOT NULL".to_string(),
            "INPUT TEXT NOT NULL".to_string(),
        ];
        columns.extend(self.columns.iter().map(|c| format!("{c} TEXT NOT NULL")));
        columns.push("RATING INTEGER NOT NULL DEFAULT 0".to_string());
        columns.push("PRIMARY KEY (ID, SUB_ID)".to_string());

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.table,
            columns.join(",\n    ")
        )
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn append(&self, record: &Record) -> Result<()> {
        for field in &record.outputs {
            validate_identifier(&field.column)?;
        }

        let mut columns = vec!["ID", "SUB_ID", "INPUT"];
        columns.extend(record.outputs.iter().map(|f| f.column.as_str()));
        columns.push("RATING");

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", "),
        );

        let mut values = vec![
            Value::Text(record.key.id.clone()),
            Value::Text(record.key.sub_id.clone()),
            Value::Text(record.input_text.clone()),
        ];
        values.extend(record.outputs.iter().map(|f| Value::Text(f.text.clone())));
        values.push(Value::Integer(Rating::Unrated.value()));

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(&sql, rusqlite::params_from_iter(values))?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(StoreError::write)?;

        log::info!(
            "store: appended record id={} sub_id={}",
            record.key.id,
            record.key.sub_id
        );
        Ok(())
    }

    async fn update_rating(&self, key: &RecordKey, vote: Vote) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET RATING = ?1 WHERE ID = ?2 AND SUB_ID = ?3",
            self.table
        );
        let (id, sub_id) = (key.id.clone(), key.sub_id.clone());

        let changed = self
            .conn
            .call(move |conn| {
                let n = conn.execute(&sql, rusqlite::params![vote.value(), id, sub_id])?;
                Ok(n)
            })
            .await
            .map_err(StoreError::write)?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                id: key.id.clone(),
                sub_id: key.sub_id.clone(),
            });
        }

        log::info!("store: rated id={} sub_id={} as {}", key.id, key.sub_id, vote.value());
        Ok(())
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        let mut select = vec!["INPUT", "RATING"];
        select.extend(self.columns.iter().map(String::as_str));
        let sql = format!(
            "SELECT {} FROM {} WHERE ID = ?1 AND SUB_ID = ?2",
            select.join(", "),
            self.table
        );
        let (id, sub_id) = (key.id.clone(), key.sub_id.clone());
        let n_outputs = self.columns.len();

        let row: Option<(String, i64, Vec<String>)> = self
            .conn
            .call(move |conn| {
                let row: Option<(String, i64, Vec<String>)> = conn
                    .query_row(&sql, rusqlite::params![id, sub_id], |r| {
                        let outputs = (0..n_outputs)
                            .map(|i| r.get::<_, String>(i + 2))
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        Ok((r.get(0)?, r.get(1)?, outputs))
                    })
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(StoreError::read)?;

        let Some((input_text, rating, texts)) = row else {
            return Ok(None);
        };

        let rating = Rating::from_value(rating)
            .ok_or_else(|| StoreError::Read(format!("rating out of range: {rating}")))?;

        Ok(Some(Record {
            key: key.clone(),
            input_text,
            outputs: self
                .columns
                .iter()
                .zip(texts)
                .map(|(column, text)| OutputField {
                    column: column.clone(),
                    text,
                })
                .collect(),
            rating,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
