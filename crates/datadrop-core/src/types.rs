//! Core types for datadrop-core.
//!
//! This module defines the data structures shared by every layer: the
//! persisted [`Record`], its [`RecordId`], and the derived, never-persisted
//! [`ClassifiedEntry`] together with its [`EntryKind`] and [`Category`]
//! discriminants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque identifier assigned by a storage backend when a record is persisted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A payload as persisted by storage.
///
/// `received_at` is always assigned by the server at ingestion time, never
/// taken from the client. Records are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub received_at: DateTime<Utc>,
    /// The JSON value exactly as it was uploaded.
    pub payload: Value,
}

/// What a classified entry turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Message,
    ToolCall,
    TextContent,
    Status,
    Unknown,
    Error,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Message => "message",
            EntryKind::ToolCall => "tool_call",
            EntryKind::TextContent => "text_content",
            EntryKind::Status => "status",
            EntryKind::Unknown => "unknown",
            EntryKind::Error => "error",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display category of a classified entry. The feed renderer picks its
/// prefix and CSS class from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AiResponse,
    SystemAction,
    SystemStatus,
    Unknown,
    Error,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::AiResponse => "ai_response",
            Category::SystemAction => "system_action",
            Category::SystemStatus => "system_status",
            Category::Unknown => "unknown",
            Category::Error => "error",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classifier's verdict on one payload.
///
/// Produced fresh on every render and never cached. `fields` carries the
/// strategy-specific extractions (`call_id`, `function_name`, `arguments`,
/// `text`, `raw`, `error`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub category: Category,
    pub content: String,
    /// Explicit `timestamp` member of the payload, if it carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ClassifiedEntry {
    pub fn new(kind: EntryKind, category: Category, content: impl Into<String>) -> Self {
        Self {
            kind,
            category,
            content: content.into(),
            timestamp: None,
            fields: Map::new(),
        }
    }

    /// Degraded entry for a payload the classifier could not handle.
    pub fn error(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(EntryKind::Error, Category::Error, message).with_field("raw", raw.into())
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
