//! SQLite backend: one row per record in a `records` table.
//!
//! `received_at` is stored as RFC 3339 with nanoseconds and a `Z` suffix, so
//! lexical order equals chronological order and the index on it answers
//! `list_recent` directly. The row's `seq` is the record id and breaks ties.
//!
//! rusqlite is synchronous; every call runs on the blocking pool behind a
//! shared connection. On open the clock is seeded past the newest stored
//! `received_at`, so a wall clock that moved backwards across a restart cannot
//! file new records behind old ones.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use datadrop_core::store::{MonotonicClock, Storage, StorageError};
use datadrop_core::{Record, RecordId};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    received_at TEXT    NOT NULL,
    payload     TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS records_received_at ON records (received_at);
";

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    clock: MonotonicClock,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let shown = path.display().to_string();
        let (conn, newest) =
            tokio::task::spawn_blocking(move || -> rusqlite::Result<(Connection, Option<String>)> {
                let conn = Connection::open(&path)?;
                conn.execute_batch(SCHEMA)?;
                let newest = newest_received_at(&conn)?;
                Ok((conn, newest))
            })
            .await
            .map_err(join_error)?
            .map_err(backend_error)?;

        info!(path = %shown, newest = ?newest, "sqlite store opened");
        Ok(Self::with_connection(conn, newest.as_deref()))
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(backend_error)?;
        conn.execute_batch(SCHEMA).map_err(backend_error)?;
        Ok(Self::with_connection(conn, None))
    }

    fn with_connection(conn: Connection, newest: Option<&str>) -> Self {
        let floor = newest.and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(err) => {
                warn!(received_at = raw, error = %err, "ignoring unreadable newest timestamp");
                None
            }
        });
        Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: floor.map_or_else(MonotonicClock::new, MonotonicClock::starting_at),
        }
    }

    async fn call<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut conn)
        })
        .await
        .map_err(join_error)?
        .map_err(backend_error)
    }
}

#[async_trait]
impl Storage for SqliteStore {
    async fn persist(&self, payload: Value) -> Result<Record, StorageError> {
        let received_at = self.clock.now();
        let stamp = received_at.to_rfc3339_opts(SecondsFormat::Nanos, true);
        let body = serde_json::to_string(&payload).map_err(std::io::Error::other)?;

        let seq = self
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO records (received_at, payload) VALUES (?1, ?2)",
                    params![stamp, body],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!(seq, "record inserted");
        Ok(Record {
            id: RecordId::new(seq.to_string()),
            received_at,
            payload,
        })
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Record>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT seq, received_at, payload FROM records
                     ORDER BY received_at DESC, seq ASC
                     LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map(params![limit], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        let records = rows
            .into_iter()
            .filter_map(|(seq, received_at, payload)| match decode_row(&received_at, &payload) {
                Ok((received_at, payload)) => Some(Record {
                    id: RecordId::new(seq.to_string()),
                    received_at,
                    payload,
                }),
                Err(err) => {
                    warn!(seq, error = %err, "skipping unreadable row");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

fn newest_received_at(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT MAX(received_at) FROM records", [], |row| row.get(0))
}

fn decode_row(received_at: &str, payload: &str) -> Result<(DateTime<Utc>, Value), String> {
    let received_at = DateTime::parse_from_rfc3339(received_at)
        .map_err(|err| format!("bad received_at {received_at:?}: {err}"))?
        .with_timezone(&Utc);
    let payload = serde_json::from_str(payload).map_err(|err| format!("bad payload: {err}"))?;
    Ok((received_at, payload))
}

fn backend_error(err: rusqlite::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn join_error(err: tokio::task::JoinError) -> StorageError {
    StorageError::Backend(format!("storage task failed: {err}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
