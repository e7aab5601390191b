//! Store — append-only persistence of [`Record`] values, read back by recency.
//!
//! [`Storage`] is the seam between the HTTP layer and the backends. This
//! module carries the in-memory backend; the file and SQLite backends live in
//! `datadrop-store`.
//!
//! # Ordering
//!
//! `list_recent` returns records by `received_at`, newest first. Records that
//! share a `received_at` keep their insertion order (the sort is stable).
//! Backends take `received_at` from a [`MonotonicClock`], so within one
//! process a later record always carries a strictly later timestamp.

use crate::types::{Record, RecordId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;

/// The two ways a storage call can fail.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The backend could not be reached or refused the operation.
    #[error("storage backend unavailable: {0}")]
    Backend(String),
}

/// Append-only record storage.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Wrap `payload` in a new record stamped with the current time, persist
    /// it, and return the record exactly as stored.
    async fn persist(&self, payload: Value) -> Result<Record, StorageError>;

    /// Up to `limit` records, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Record>, StorageError>;

    /// Short backend name for health output.
    fn backend(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Wall clock whose readings strictly increase within one process.
#[derive(Debug)]
pub struct MonotonicClock {
    last: Mutex<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::MIN_UTC)
    }

    /// Clock whose readings are all later than `floor`.
    pub fn starting_at(floor: DateTime<Utc>) -> Self {
        Self {
            last: Mutex::new(floor),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + chrono::Duration::nanoseconds(1)
        };
        *last = next;
        next
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort records newest first, keeping insertion order among equal
/// timestamps. `records` must be in insertion order on entry.
pub fn sort_recent(records: &mut [Record]) {
    records.sort_by(|a, b| b.received_at.cmp(&a.received_at));
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Process-local storage. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
    clock: MonotonicClock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record, bypassing the clock. Used to seed fixed
    /// timestamps in tests and demos.
    pub async fn insert(&self, record: Record) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn persist(&self, payload: Value) -> Result<Record, StorageError> {
        let mut records = self.records.write().await;
        let record = Record {
            id: RecordId::new(format!("{:012}", records.len() + 1)),
            received_at: self.clock.now(),
            payload,
        };
        records.push(record.clone());
        tracing::debug!(id = %record.id, "record stored in memory");
        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Record>, StorageError> {
        let mut records = self.records.read().await.clone();
        sort_recent(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
