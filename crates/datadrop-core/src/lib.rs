//! datadrop-core — classifier, feed renderer and shared types.
//!
//! # Architecture
//!
//! ```text
//! upload ──► Storage ──► list_recent ──► Classifier ──► FeedRenderer ──► html / text / json
//! ```
//!
//! Storage is a trait ([`store::Storage`]); everything after it is pure,
//! synchronous and free of shared mutable state.

pub mod classifier;
pub mod config;
pub mod error;
pub mod extract;
pub mod render;
pub mod store;
pub mod types;

pub use classifier::{Classifier, SchemaVariant};
pub use config::Config;
pub use render::{FeedFormat, FeedItem, FeedRenderer, PrefixTable};
pub use store::{MemoryStore, Storage, StorageError};
pub use types::{Category, ClassifiedEntry, EntryKind, Record, RecordId};
