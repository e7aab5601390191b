//! Error types for the classifier and renderer.
//!
//! None of these escape the public `classify` / `render_feed` contracts; they
//! are converted into data (error entries, inline error blocks) at the
//! boundary. Storage errors live in [`crate::store`].

/// Errors raised while classifying a single payload.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// No `key=<quote>...` pattern in the inspected text.
    #[error("no {key}= value found")]
    Extraction { key: String },
    /// The embedded tool arguments are not valid JSON.
    #[error("tool arguments are not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    /// A structured field held something other than text.
    #[error("field `{field}` holds {found}, expected a string")]
    NotText { field: &'static str, found: &'static str },
    /// The regex shim failed to build a pattern for a key.
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors raised while formatting one feed entry.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid timestamp format {0:?}")]
    TimestampFormat(String),
    #[error("formatting failed")]
    Fmt(#[from] std::fmt::Error),
}
