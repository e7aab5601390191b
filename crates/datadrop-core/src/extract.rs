//! Quoted-value extraction from stringified upstream objects.
//!
//! Upstream producers send things like
//! `Text(annotations=[], value="Hello there")` or
//! `RequiredActionFunctionToolCall(id='call_1', function=Function(arguments='{}', name='lookup'))`
//! as plain strings. This module pulls the `key=<quote>...` values out of them.
//!
//! Two extractors implement the same delimiter rules:
//!
//! | Quote  | Pattern            | Capture ends at                        |
//! |--------|--------------------|----------------------------------------|
//! | double | `key="([^"]*)`     | next `"`, or end of text (open-ended)  |
//! | single | `key='([^']*)'`    | next `'`; no match without it          |
//!
//! [`Extractor::Scanner`] is a direct string scan and is the default.
//! [`Extractor::Regex`] is the compatibility shim that runs the literal
//! patterns above; both must agree on every input.

use crate::error::ClassifyError;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// Delimiter around an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Single,
    Double,
}

impl Quote {
    fn as_char(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }
}

/// Which implementation performs `key=<quote>` extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extractor {
    #[default]
    Scanner,
    Regex,
}

impl Extractor {
    /// Return the first value quoted after `key=` in `haystack`.
    pub fn quoted<'a>(
        self,
        haystack: &'a str,
        key: &str,
        quote: Quote,
    ) -> Result<&'a str, ClassifyError> {
        let found = match self {
            Extractor::Scanner => scan_quoted(haystack, key, quote),
            Extractor::Regex => regex_quoted(haystack, key, quote)?,
        };
        found.ok_or_else(|| ClassifyError::Extraction {
            key: key.to_string(),
        })
    }
}

fn scan_quoted<'a>(haystack: &'a str, key: &str, quote: Quote) -> Option<&'a str> {
    let q = quote.as_char();
    let mut needle = String::with_capacity(key.len() + 2);
    needle.push_str(key);
    needle.push('=');
    needle.push(q);

    let start = haystack.find(&needle)? + needle.len();
    let rest = &haystack[start..];
    match (rest.find(q), quote) {
        (Some(end), _) => Some(&rest[..end]),
        (None, Quote::Double) => Some(rest),
        (None, Quote::Single) => None,
    }
}

// Compiles on every call. Only used when the shim is selected in config.
fn regex_quoted<'a>(
    haystack: &'a str,
    key: &str,
    quote: Quote,
) -> Result<Option<&'a str>, regex::Error> {
    let key = regex::escape(key);
    let pattern = match quote {
        Quote::Double => format!(r#"{key}="([^"]*)"#),
        Quote::Single => format!(r"{key}='([^']*)'"),
    };
    let re = Regex::new(&pattern)?;
    Ok(re
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str()))
}

// ---------------------------------------------------------------------------
// Loose text
// ---------------------------------------------------------------------------

/// Render a JSON value as human-oriented text without escaping strings.
///
/// A top-level string comes back verbatim. Nested strings are wrapped in `"`
/// but their contents are left untouched, so embedded `value="..."` markers
/// survive for extraction. Objects and arrays use JSON-like punctuation.
pub fn loose_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => {
            let mut out = String::new();
            write_loose(&mut out, other);
            out
        }
    }
}

fn write_loose(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_loose(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push('"');
                out.push_str(key);
                out.push_str("\": ");
                write_loose(out, item);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
