//! File-per-record backend.
//!
//! Every record is written as a pretty-printed JSON document named
//! `upload_<YYYYmmdd_HHMMSS_micros>_<seq>.json` inside the store directory.
//! The record id is the file stem. Files are written to a `.tmp` sibling and
//! renamed into place, so a reader never sees a half-written record.
//!
//! The sequence number orders records that share a timestamp and resumes
//! after the highest one already on disk when the store is reopened. File
//! names order the same way the records do, so `list_recent` picks the newest
//! names first and only reads as many files as it returns. Files that fail to
//! parse are skipped with a warning rather than failing the read.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use datadrop_core::store::{sort_recent, MonotonicClock, Storage, StorageError};
use datadrop_core::{Record, RecordId};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

const PREFIX: &str = "upload_";
const EXTENSION: &str = ".json";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    next_seq: Mutex<u64>,
    clock: MonotonicClock,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let names = record_names(&dir).await?;
        let max_seq = names.iter().map(|name| name.seq).max().unwrap_or(0);
        let clock = match names.iter().filter_map(RecordName::latest_instant).max() {
            Some(floor) => MonotonicClock::starting_at(floor),
            None => MonotonicClock::new(),
        };

        info!(dir = %dir.display(), next_seq = max_seq + 1, "file store opened");
        Ok(Self {
            dir,
            next_seq: Mutex::new(max_seq + 1),
            clock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Storage for FileStore {
    async fn persist(&self, payload: Value) -> Result<Record, StorageError> {
        let (seq, received_at) = {
            let mut next = self.next_seq.lock().unwrap_or_else(PoisonError::into_inner);
            let seq = *next;
            *next += 1;
            (seq, self.clock.now())
        };

        let id = RecordId::new(format!(
            "{PREFIX}{}_{seq:06}",
            received_at.format("%Y%m%d_%H%M%S_%6f")
        ));
        let record = Record {
            id,
            received_at,
            payload,
        };
        let body = serde_json::to_vec_pretty(&record).map_err(std::io::Error::other)?;

        let path = self.dir.join(format!("{}{EXTENSION}", record.id));
        let tmp = self.dir.join(format!("{}{EXTENSION}.tmp", record.id));
        write_atomically(&tmp, &path, &body).await?;

        info!(path = %path.display(), "record written");
        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Record>, StorageError> {
        let mut names = match record_names(&self.dir).await {
            Ok(names) => names,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        names.sort_unstable_by(|a, b| b.cmp(a));

        let mut records = Vec::with_capacity(limit.min(names.len()));
        for name in names {
            if records.len() == limit {
                break;
            }
            match read_record(&self.dir.join(&name.file)).await {
                Ok(record) => records.push(record),
                Err(err) => warn!(file = %name.file, error = %err, "skipping unreadable record"),
            }
        }

        // Back to insertion order so ties keep it through the stable sort.
        records.reverse();
        sort_recent(&mut records);
        debug!(count = records.len(), limit, "listed recent records");
        Ok(records)
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A record file name split into its ordering parts. Orders by stamp, then
/// sequence number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RecordName {
    stamp: String,
    seq: u64,
    file: String,
}

impl RecordName {
    fn parse(file: &str) -> Option<Self> {
        let stem = file.strip_prefix(PREFIX)?.strip_suffix(EXTENSION)?;
        let (stamp, seq) = stem.rsplit_once('_')?;
        Some(Self {
            stamp: stamp.to_string(),
            seq: seq.parse().ok()?,
            file: file.to_string(),
        })
    }

    /// Upper bound for the `received_at` of the record in this file. The
    /// name keeps microseconds; the record may carry nanoseconds past them.
    fn latest_instant(&self) -> Option<DateTime<Utc>> {
        let (seconds, micros) = self.stamp.rsplit_once('_')?;
        let seconds = NaiveDateTime::parse_from_str(seconds, STAMP_FORMAT).ok()?;
        let micros: i64 = micros.parse().ok()?;
        Some(
            seconds.and_utc() + Duration::microseconds(micros) + Duration::nanoseconds(999),
        )
    }
}

/// Sequence number of a record file name, `None` for anything else.
fn parse_seq(name: &str) -> Option<u64> {
    RecordName::parse(name).map(|name| name.seq)
}

async fn record_names(dir: &Path) -> std::io::Result<Vec<RecordName>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = RecordName::parse(&entry.file_name().to_string_lossy()) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Write `body` to `tmp` and rename it to `path`. `tmp` is removed if either
/// step fails.
async fn write_atomically(tmp: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    let written = match tokio::fs::write(tmp, body).await {
        Ok(()) => tokio::fs::rename(tmp, path).await,
        Err(err) => Err(err),
    };
    if written.is_err() {
        if let Err(err) = tokio::fs::remove_file(tmp).await {
            debug!(path = %tmp.display(), error = %err, "temp file not removed");
        }
    }
    written
}

async fn read_record(path: &Path) -> std::io::Result<Record> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes).map_err(std::io::Error::other)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
