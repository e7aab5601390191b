//! datadrop — JSON drop box with a classified, human-readable feed.
//!
//! Clients POST arbitrary JSON to `/upload`; every payload is stored as a
//! timestamped record. The feed reads the most recent records back,
//! classifies each one (status update, message, tool call, text block or
//! unknown) and renders it as HTML, plain text or JSON.
//!
//! # Architecture
//!
//! ```text
//! HTTP / CLI ──► Storage (memory | file | sqlite) ──► Classifier ──► FeedRenderer
//! ```
//!
//! This crate re-exports the member crates so integration tests and benches
//! can import everything from one place, and holds the command bodies the
//! binary dispatches to.

pub use datadrop_core::{classifier, config, error, extract, render, store, types};
pub use datadrop_core::{
    Category, ClassifiedEntry, Classifier, Config, EntryKind, FeedFormat, FeedRenderer,
    MemoryStore, Record, RecordId, Storage, StorageError,
};
pub use datadrop_server as server;
pub use datadrop_store as backends;

pub mod commands;
