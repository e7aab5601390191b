//! Test builders for payloads and records.
//!
//! These are for readability in assertions, not production use; they panic
//! on invalid input rather than returning `Result`.

use chrono::{DateTime, TimeZone, Utc};
use datadrop::{Record, RecordId};
use serde_json::{json, Map, Value};

/// 2024-01-15T10:00:00Z. Record offsets in the harnesses are seconds from here.
pub const BASE_EPOCH: i64 = 1_705_312_800;

pub fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(BASE_EPOCH + offset_secs, 0).unwrap()
}

// ---------------------------------------------------------------------------
// PayloadBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for upload bodies.
///
/// # Example
///
/// ```rust
/// let payload = PayloadBuilder::new()
///     .status("in_progress")
///     .timestamp("2024-01-15T10:00:00")
///     .build();
/// ```
#[derive(Default)]
pub struct PayloadBuilder {
    data: Option<Value>,
    timestamp: Option<String>,
    unwrapped: bool,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(self, status: &str) -> Self {
        self.member("status", status)
    }

    pub fn messages(self, messages: &str) -> Self {
        self.member("messages", messages)
    }

    pub fn tool_calls(self, tool_calls: &str) -> Self {
        self.member("tool_calls", tool_calls)
    }

    /// Add a member to the `data` object.
    pub fn member(mut self, key: &str, value: impl Into<Value>) -> Self {
        let mut map = match self.data.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        map.insert(key.to_string(), value.into());
        self.data = Some(Value::Object(map));
        self
    }

    /// Replace `data` wholesale.
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn timestamp(mut self, timestamp: &str) -> Self {
        self.timestamp = Some(timestamp.to_string());
        self
    }

    /// Send `data` as the whole body instead of under a `data` member.
    pub fn unwrapped(mut self) -> Self {
        self.unwrapped = true;
        self
    }

    pub fn build(self) -> Value {
        let data = self.data.unwrap_or_else(|| json!({}));
        if self.unwrapped {
            return data;
        }
        let mut body = json!({ "data": data });
        if let Some(ts) = self.timestamp {
            body["timestamp"] = Value::String(ts);
        }
        body
    }
}

// ---------------------------------------------------------------------------
// Stringified SDK objects
// ---------------------------------------------------------------------------

/// A tool call as an assistant SDK prints it.
pub fn tool_call_repr(id: &str, name: &str, arguments: &str) -> String {
    format!(
        "RequiredActionFunctionToolCall(id='{id}', function=Function(arguments='{arguments}', name='{name}'), type='function')"
    )
}

/// A text content block as an assistant SDK prints it.
pub fn text_block_repr(value: &str) -> String {
    format!("TextContentBlock(text=Text(annotations=[], value=\"{value}\"), type='text')")
}

/// A message list whose single message carries `value`.
pub fn message_repr(value: &str) -> String {
    format!(
        "[Message(id='msg_1', content=[{}], role='assistant')]",
        text_block_repr(value)
    )
}

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Record`] fixtures with fixed timestamps.
pub struct RecordBuilder {
    id: String,
    received_at: DateTime<Utc>,
    payload: Value,
}

impl RecordBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            received_at: at(0),
            payload: json!({}),
        }
    }

    pub fn at(mut self, offset_secs: i64) -> Self {
        self.received_at = at(offset_secs);
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Record {
        Record {
            id: RecordId::new(self.id),
            received_at: self.received_at,
            payload: self.payload,
        }
    }
}
