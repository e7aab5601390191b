//! Feed renderer — classifies recent records and formats them for display.
//!
//! Records arrive newest first (as returned by
//! [`Storage::list_recent`](crate::store::Storage::list_recent)). Each is
//! classified on its own and turned into a [`FeedItem`]; a record whose item
//! cannot be built is replaced by an inline error block so one bad record
//! never takes the whole feed down.
//!
//! # Prefixes
//!
//! | Category        | Default prefix |
//! |-----------------|----------------|
//! | `ai_response`   | `>> AI:`       |
//! | `system_action` | `## SYS:`      |
//! | `system_status` | `!! STATUS:`   |
//! | `error`         | `** ERROR:`    |
//! | `unknown`       | `?? LOG:`      |
//! | anything else   | `-- LOG:`      |
//!
//! The table comes from `[feed.prefixes]` in the config.

use crate::classifier::Classifier;
use crate::config::{Config, FeedConfig, TimestampMode};
use crate::error::RenderError;
use crate::extract::loose_text;
use crate::types::{Category, ClassifiedEntry, Record, RecordId};
use chrono::{DateTime, Utc};
use maud::{html, PreEscaped, DOCTYPE};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::warn;

const FEED_CSS: &str = r#"
body { margin: 0; background: #0a0a0a; }
.feed-container { font-family: 'Courier New', monospace; padding: 20px; color: #33ff33; }
.entry { margin-bottom: 15px; padding: 10px; border-left: 3px solid #33ff33; background: rgba(0, 255, 0, 0.05); }
.entry.empty { opacity: 0.6; }
.timestamp { color: #666; font-size: 0.8em; }
.content { margin-top: 5px; white-space: pre-wrap; word-break: break-word; }
.prefix { opacity: 0.7; }
.system_action { color: #00ffff; border-left-color: #00ffff; }
.system_status { color: #ff9900; border-left-color: #ff9900; }
.error { color: #ff3333; border-left-color: #ff3333; }
"#;

/// Output flavour of a rendered feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedFormat {
    #[default]
    Html,
    Text,
    Json,
}

impl std::str::FromStr for FeedFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(FeedFormat::Html),
            "text" | "txt" => Ok(FeedFormat::Text),
            "json" => Ok(FeedFormat::Json),
            other => Err(format!("unknown feed format: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Prefix table
// ---------------------------------------------------------------------------

/// Category name → display prefix, with a fallback for unlisted categories.
#[derive(Debug, Clone)]
pub struct PrefixTable {
    prefixes: BTreeMap<String, String>,
    fallback: String,
}

impl PrefixTable {
    pub fn new(prefixes: BTreeMap<String, String>, fallback: impl Into<String>) -> Self {
        Self {
            prefixes,
            fallback: fallback.into(),
        }
    }

    pub fn from_config(feed: &FeedConfig) -> Self {
        Self::new(feed.prefixes.clone(), feed.default_prefix.clone())
    }

    pub fn prefix_for(&self, category: &str) -> &str {
        self.prefixes
            .get(category)
            .map_or(self.fallback.as_str(), String::as_str)
    }
}

impl Default for PrefixTable {
    fn default() -> Self {
        Self::from_config(&Config::defaults().feed)
    }
}

// ---------------------------------------------------------------------------
// Feed items
// ---------------------------------------------------------------------------

/// One display block of the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: RecordId,
    pub received_at: DateTime<Utc>,
    pub display_timestamp: String,
    pub prefix: String,
    /// CSS class for the HTML view; the category name.
    #[serde(skip)]
    pub css_class: &'static str,
    pub entry: ClassifiedEntry,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Builds feed views from records. Holds no mutable state; one instance can
/// serve concurrent requests.
#[derive(Debug, Clone)]
pub struct FeedRenderer {
    classifier: Classifier,
    prefixes: PrefixTable,
    timestamp: TimestampMode,
    timestamp_format: String,
    title: String,
}

impl FeedRenderer {
    pub fn new(classifier: Classifier, feed: &FeedConfig) -> Self {
        Self {
            classifier,
            prefixes: PrefixTable::from_config(feed),
            timestamp: feed.timestamp,
            timestamp_format: feed.timestamp_format.clone(),
            title: feed.title.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Classifier::new(config.classifier.extractor), &config.feed)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify and format every record. Never fails: a record whose item
    /// cannot be built is replaced by an error block.
    pub fn items(&self, records: &[Record]) -> Vec<FeedItem> {
        let now = Utc::now();
        records
            .iter()
            .map(|record| {
                self.item(record, now).unwrap_or_else(|err| {
                    warn!(record = %record.id, error = %err, "feed entry replaced by error block");
                    self.error_item(record, &err)
                })
            })
            .collect()
    }

    /// Render `records` (newest first) in the requested format.
    pub fn render_feed(&self, records: &[Record], format: FeedFormat) -> String {
        let items = self.items(records);
        match format {
            FeedFormat::Html => self.render_html(&items),
            FeedFormat::Text => render_text(&items),
            FeedFormat::Json => render_json(&items),
        }
    }

    fn item(&self, record: &Record, now: DateTime<Utc>) -> Result<FeedItem, RenderError> {
        let entry = self.classifier.classify(&record.payload);
        let display_timestamp = self.display_timestamp(record, &entry, now)?;
        Ok(FeedItem {
            id: record.id.clone(),
            received_at: record.received_at,
            display_timestamp,
            prefix: self.prefixes.prefix_for(entry.category.as_str()).to_string(),
            css_class: entry.category.as_str(),
            entry,
        })
    }

    fn error_item(&self, record: &Record, err: &RenderError) -> FeedItem {
        let entry = ClassifiedEntry::error(
            format!("failed to render record {}: {err}", record.id),
            loose_text(&record.payload),
        );
        FeedItem {
            id: record.id.clone(),
            received_at: record.received_at,
            display_timestamp: record.received_at.to_rfc3339(),
            prefix: self.prefixes.prefix_for(Category::Error.as_str()).to_string(),
            css_class: Category::Error.as_str(),
            entry,
        }
    }

    fn display_timestamp(
        &self,
        record: &Record,
        entry: &ClassifiedEntry,
        now: DateTime<Utc>,
    ) -> Result<String, RenderError> {
        match (self.timestamp, &entry.timestamp) {
            (TimestampMode::Received, _) => self.format_time(record.received_at),
            (TimestampMode::RenderTime, Some(explicit)) => Ok(explicit.clone()),
            (TimestampMode::RenderTime, None) => self.format_time(now),
        }
    }

    fn format_time(&self, time: DateTime<Utc>) -> Result<String, RenderError> {
        let mut out = String::new();
        write!(out, "{}", time.format(&self.timestamp_format))
            .map_err(|_| RenderError::TimestampFormat(self.timestamp_format.clone()))?;
        Ok(out)
    }

    fn render_html(&self, items: &[FeedItem]) -> String {
        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (self.title) }
                    style { (PreEscaped(FEED_CSS)) }
                }
                body {
                    div class="feed-container" {
                        @if items.is_empty() {
                            div class="entry empty" { "No entries yet." }
                        }
                        @for item in items {
                            div class={ "entry " (item.css_class) } data-id=(item.id.as_str()) {
                                div class="timestamp" { "[" (item.display_timestamp) "]" }
                                div class="content" {
                                    span class="prefix" { (item.prefix) }
                                    " "
                                    (item.entry.content)
                                }
                            }
                        }
                    }
                }
            }
        };
        markup.into_string()
    }

    /// A feed page holding a single error block, for when the records
    /// themselves could not be loaded.
    pub fn render_error_page(&self, message: &str) -> String {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    style { (PreEscaped(FEED_CSS)) }
                }
                body {
                    div class="feed-container" {
                        div class="entry error" {
                            div class="content" {
                                span class="prefix" { (self.prefixes.prefix_for(Category::Error.as_str())) }
                                " "
                                (message)
                            }
                        }
                    }
                }
            }
        }
        .into_string()
    }
}

/// One line per item; line breaks inside a field are written as `\n` / `\r`.
fn render_text(items: &[FeedItem]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&format!(
            "[{}] {} {}\n",
            single_line(&item.display_timestamp),
            item.prefix,
            single_line(&item.entry.content)
        ));
    }
    out
}

fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\n', '\r']) {
        Cow::Owned(text.replace('\r', "\\r").replace('\n', "\\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn render_json(items: &[FeedItem]) -> String {
    serde_json::to_string_pretty(items).unwrap_or_else(|err| {
        warn!(error = %err, "feed serialization failed");
        "[]".to_string()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
