//! Classifier — turns an uploaded payload into a [`ClassifiedEntry`].
//!
//! The inspected value is the payload's `data` member when it has one, the
//! whole payload otherwise. Two dispatch strategies coexist, selected by
//! [`SchemaVariant::detect`]:
//!
//! - **Structured**: the data is an object with a `status`, `messages` or
//!   `tool_calls` key (first present wins, in that order).
//! - **Sniffed**: the loose text of the data contains one of the upstream
//!   SDK class names `RequiredActionFunctionToolCall` / `TextContentBlock`.
//!
//! Anything else is `unknown`. [`Classifier::classify`] is total: internal
//! failures come back as an `error` entry instead of propagating.

use crate::error::ClassifyError;
use crate::extract::{loose_text, Extractor, Quote};
use crate::types::{Category, ClassifiedEntry, EntryKind};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Object keys that select the structured strategy, in dispatch order.
pub const STRUCTURED_KEYS: [&str; 3] = ["status", "messages", "tool_calls"];
/// Marker for function tool calls in stringified assistant runs.
pub const TOOL_CALL_MARKER: &str = "RequiredActionFunctionToolCall";
/// Marker for assistant text blocks in stringified messages.
pub const TEXT_CONTENT_MARKER: &str = "TextContentBlock";

const UNKNOWN: &str = "unknown";

/// Which classification strategy a payload's data calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    Structured,
    Sniffed,
}

impl SchemaVariant {
    /// Pick the strategy for `data`, whose loose text is `text`. `None` means
    /// no known shape matched.
    pub fn detect(data: &Value, text: &str) -> Option<Self> {
        if let Value::Object(map) = data {
            if STRUCTURED_KEYS.iter().any(|key| map.contains_key(*key)) {
                return Some(SchemaVariant::Structured);
            }
        }
        if text.contains(TOOL_CALL_MARKER) || text.contains(TEXT_CONTENT_MARKER) {
            return Some(SchemaVariant::Sniffed);
        }
        None
    }
}

/// Stateless payload classifier. Cheap to copy and safe to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    extractor: Extractor,
}

impl Classifier {
    pub fn new(extractor: Extractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> Extractor {
        self.extractor
    }

    /// Classify one payload. Never fails; errors degrade to an entry of kind
    /// [`EntryKind::Error`] carrying the message and the raw text.
    pub fn classify(&self, payload: &Value) -> ClassifiedEntry {
        let data = inspected_data(payload);
        let text = loose_text(data);

        let mut entry = match self.try_classify(data, &text) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "payload classification failed");
                ClassifiedEntry::error(format!("Error parsing data: {err}"), text)
            }
        };
        entry.timestamp = explicit_timestamp(payload);
        entry
    }

    fn try_classify(&self, data: &Value, text: &str) -> Result<ClassifiedEntry, ClassifyError> {
        match (SchemaVariant::detect(data, text), data) {
            (Some(SchemaVariant::Structured), Value::Object(map)) => self.structured(map, text),
            (Some(SchemaVariant::Sniffed), _) => Ok(self.sniffed(text)),
            _ => Ok(unknown(text)),
        }
    }

    // -----------------------------------------------------------------------
    // Strategy A: structured keys
    // -----------------------------------------------------------------------

    fn structured(
        &self,
        map: &Map<String, Value>,
        text: &str,
    ) -> Result<ClassifiedEntry, ClassifyError> {
        if let Some(value) = map.get("status") {
            let status = expect_text("status", value)?;
            let content = status.replace('_', " ");
            return Ok(
                ClassifiedEntry::new(EntryKind::Status, Category::SystemStatus, content.trim())
                    .with_field("raw", status),
            );
        }

        if let Some(value) = map.get("messages") {
            let message = expect_text("messages", value)?;
            let text = match self.extractor.quoted(message, "value", Quote::Double) {
                Ok(text) => text,
                Err(err) => {
                    debug!(error = %err, "message without value marker, using raw text");
                    message
                }
            };
            let content = text.trim();
            return Ok(
                ClassifiedEntry::new(EntryKind::Message, Category::AiResponse, content)
                    .with_field("text", content)
                    .with_field("raw", message),
            );
        }

        if let Some(value) = map.get("tool_calls") {
            let call = expect_text("tool_calls", value)?;
            let call_id = self.extractor.quoted(call, "id", Quote::Single).ok();
            let function = self.extractor.quoted(call, "function", Quote::Single).ok();

            let mut content = format!("Tool Call: {}", call_id.unwrap_or(UNKNOWN));
            if let Some(name) = function {
                content.push_str(&format!(" (Function: {name})"));
            }
            return Ok(
                ClassifiedEntry::new(EntryKind::ToolCall, Category::SystemAction, content)
                    .with_field("call_id", optional(call_id))
                    .with_field("function", optional(function))
                    .with_field("raw", call),
            );
        }

        Ok(unknown(text))
    }

    // -----------------------------------------------------------------------
    // Strategy B: substring sniffing
    // -----------------------------------------------------------------------

    fn sniffed(&self, text: &str) -> ClassifiedEntry {
        if text.contains(TOOL_CALL_MARKER) {
            self.tool_call(text)
        } else if text.contains(TEXT_CONTENT_MARKER) {
            self.text_content(text)
        } else {
            unknown(text)
        }
    }

    fn tool_call(&self, text: &str) -> ClassifiedEntry {
        let name = self
            .extractor
            .quoted(text, "name", Quote::Single)
            .unwrap_or(UNKNOWN);
        let mut entry = ClassifiedEntry::new(EntryKind::ToolCall, Category::SystemAction, "")
            .with_field("function_name", name)
            .with_field("raw", text);

        let arguments = match self.extractor.quoted(text, "arguments", Quote::Single) {
            Ok(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(arguments) => arguments,
                Err(err) => {
                    let err = ClassifyError::from(err);
                    warn!(error = %err, function = name, "tool call arguments undecodable");
                    entry = entry.with_field("error", err.to_string());
                    Value::Object(Map::new())
                }
            },
            Err(_) => Value::Object(Map::new()),
        };

        entry.content = tool_call_content(name, &arguments);
        entry.with_field("arguments", arguments)
    }

    fn text_content(&self, text: &str) -> ClassifiedEntry {
        let value = self
            .extractor
            .quoted(text, "value", Quote::Double)
            .unwrap_or(text);
        ClassifiedEntry::new(EntryKind::TextContent, Category::AiResponse, value)
            .with_field("text", value)
            .with_field("raw", text)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn inspected_data(payload: &Value) -> &Value {
    payload
        .as_object()
        .and_then(|map| map.get("data"))
        .unwrap_or(payload)
}

fn explicit_timestamp(payload: &Value) -> Option<String> {
    payload
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn unknown(text: &str) -> ClassifiedEntry {
    ClassifiedEntry::new(EntryKind::Unknown, Category::Unknown, text).with_field("raw", text)
}

fn expect_text<'a>(field: &'static str, value: &'a Value) -> Result<&'a str, ClassifyError> {
    value.as_str().ok_or(ClassifyError::NotText {
        field,
        found: json_type(value),
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn optional(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}

fn tool_call_content(name: &str, arguments: &Value) -> String {
    let empty = match arguments {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        format!("Tool Call: {name}")
    } else {
        format!("Tool Call: {name} {arguments}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
