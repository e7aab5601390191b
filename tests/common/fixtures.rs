//! Payload corpora used across harnesses.

use super::builders::*;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use serde_json::{json, Value};

/// Run statuses as the assistant API reports them.
pub const STATUSES: &[&str] = &[
    "queued",
    "in_progress",
    "requires_action",
    "cancelling",
    "cancelled",
    "failed",
    "completed",
    "expired",
];

/// One payload of each shape the classifier recognises, plus an unknown one.
pub fn mixed_payloads() -> Vec<Value> {
    vec![
        PayloadBuilder::new().status("in_progress").build(),
        PayloadBuilder::new()
            .messages(&message_repr("Here is the forecast."))
            .build(),
        PayloadBuilder::new()
            .tool_calls("id='call_42', function='get_weather'")
            .build(),
        PayloadBuilder::new()
            .data(tool_call_repr("call_7", "search", r#"{"q": "rust"}"#))
            .build(),
        PayloadBuilder::new()
            .data(text_block_repr("The answer is 42."))
            .build(),
        json!({"event": "heartbeat", "seq": 9}),
    ]
}

/// `n` lorem sentences. Lorem text never contains quotes, so it survives
/// being embedded in a stringified SDK object.
pub fn fake_sentences(n: usize) -> Vec<String> {
    (0..n).map(|_| Sentence(3..10).fake::<String>()).collect()
}
