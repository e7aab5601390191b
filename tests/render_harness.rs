//! Feed rendering integration harness.
//!
//! # What this covers
//!
//! - **Ordering**: records read back newest first render newest first; equal
//!   timestamps keep insertion order.
//! - **Formats**: HTML (escaped, one `.entry` block per record), plain text
//!   (one line per record) and JSON (one item per record).
//! - **Isolation**: one record that fails to render becomes an error block; the
//!   rest of the feed is unaffected.
//! - **Snapshot**: the text feed for a mixed corpus is pinned with an insta
//!   inline snapshot.
//!
//! # What this does NOT cover
//!
//! - Serving the feed over HTTP (see `server_harness`)
//!
//! # Running
//!
//! ```sh
//! cargo test --test render_harness
//! # Update snapshots after intentional changes:
//! cargo insta review
//! ```

mod common;
use common::*;

use datadrop::config::TimestampMode;
use datadrop::{Config, FeedFormat, FeedRenderer, MemoryStore, Record, Storage};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn renderer() -> FeedRenderer {
    FeedRenderer::from_config(&Config::defaults())
}

/// Records `r0..` one minute apart, oldest first.
fn minute_records(payloads: Vec<Value>) -> Vec<Record> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(i, payload)| {
            RecordBuilder::new(&format!("r{i}"))
                .at(i as i64 * 60)
                .payload(payload)
                .build()
        })
        .collect()
}

async fn seeded_store(records: Vec<Record>) -> MemoryStore {
    let store = MemoryStore::new();
    for record in records {
        store.insert(record).await;
    }
    store
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_most_recent_of_three_render_newest_first() {
    let records = vec![
        RecordBuilder::new("t1").at(0).payload(PayloadBuilder::new().status("queued").build()).build(),
        RecordBuilder::new("t2").at(10).payload(PayloadBuilder::new().status("in_progress").build()).build(),
        RecordBuilder::new("t3").at(20).payload(PayloadBuilder::new().status("completed").build()).build(),
    ];
    let store = seeded_store(records).await;

    let recent = store.list_recent(2).await.unwrap();
    assert_ids!(recent, ["t3", "t2"]);

    let out = renderer().render_feed(&recent, FeedFormat::Text);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[2024-01-15 10:00:20] !! STATUS: completed",
            "[2024-01-15 10:00:10] !! STATUS: in progress",
        ]
    );
}

#[tokio::test]
async fn equal_timestamps_keep_insertion_order() {
    let records = vec![
        RecordBuilder::new("a").at(0).build(),
        RecordBuilder::new("b").at(5).build(),
        RecordBuilder::new("c").at(5).build(),
    ];
    let store = seeded_store(records).await;
    assert_ids!(store.list_recent(10).await.unwrap(), ["b", "c", "a"]);
}

#[tokio::test]
async fn empty_storage_renders_empty_feed() {
    let store = MemoryStore::new();
    let recent = store.list_recent(50).await.unwrap();
    let r = renderer();
    assert_eq!(r.render_feed(&recent, FeedFormat::Text), "");
    assert!(r.render_feed(&recent, FeedFormat::Html).contains("No entries yet."));
}

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

#[test]
fn text_feed_snapshot() {
    let mut records = minute_records(vec![
        json!({"data": {"event": "boot"}}),
        PayloadBuilder::new().messages("Text(value=\"hi\")").build(),
        PayloadBuilder::new()
            .data(tool_call_repr("call_9", "search", r#"{"q": "rust"}"#))
            .build(),
        PayloadBuilder::new().status("in_progress").build(),
    ]);
    records.reverse();

    let out = renderer().render_feed(&records, FeedFormat::Text);
    insta::assert_snapshot!(out.trim_end(), @r###"
    [2024-01-15 10:03:00] !! STATUS: in progress
    [2024-01-15 10:02:00] ## SYS: Tool Call: search {"q":"rust"}
    [2024-01-15 10:01:00] >> AI: hi
    [2024-01-15 10:00:00] ?? LOG: {"event": "boot"}
    "###);
}

#[test]
fn html_feed_has_one_block_per_record() {
    let mut records = minute_records(mixed_payloads());
    records.reverse();
    let html = renderer().render_feed(&records, FeedFormat::Html);

    assert_eq!(html.matches(r#"<div class="entry "#).count(), records.len());
    assert!(html.contains(r#"class="entry system_status""#));
    assert!(html.contains(r#"class="entry system_action""#));
    assert!(html.contains(r#"data-id="r0""#));
    assert!(html.contains("Here is the forecast."));
}

#[test]
fn html_feed_escapes_payload_text() {
    let records = minute_records(vec![
        PayloadBuilder::new().data(text_block_repr("<b>bold</b> & more")).build(),
    ]);
    let html = renderer().render_feed(&records, FeedFormat::Html);
    assert!(html.contains("&lt;b&gt;bold&lt;/b&gt; &amp; more"));
    assert!(!html.contains("<b>bold</b>"));
}

#[test]
fn json_feed_lists_classified_items() {
    let mut records = minute_records(mixed_payloads());
    records.reverse();
    let out = renderer().render_feed(&records, FeedFormat::Json);
    let items: Vec<Value> = serde_json::from_str(&out).unwrap();

    assert_eq!(items.len(), records.len());
    assert_eq!(items[0]["id"], "r5");
    assert_eq!(items[0]["entry"]["type"], "unknown");
    assert_eq!(items[5]["entry"]["type"], "status");
    assert_eq!(items[5]["prefix"], "!! STATUS:");
}

#[test]
fn custom_prefixes_apply() {
    let cfg = Config::from_toml_str(
        r#"
        [feed]
        default_prefix = "--"

        [feed.prefixes]
        system_status = "[status]"
        "#,
    )
    .unwrap();
    let records = minute_records(vec![PayloadBuilder::new().status("queued").build()]);
    let out = FeedRenderer::from_config(&cfg).render_feed(&records, FeedFormat::Text);
    assert_eq!(out, "[2024-01-15 10:00:00] [status] queued\n");
}

#[test]
fn multi_line_content_stays_on_one_text_line() {
    let mut records = minute_records(vec![
        PayloadBuilder::new().messages("line one\nline two").build(),
        json!({"data": {"note": "x\ny"}}),
    ]);
    records.reverse();

    let out = renderer().render_feed(&records, FeedFormat::Text);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2, "{out:?}");
    assert!(lines[0].starts_with("[2024-01-15 10:01:00] ?? LOG: "), "{}", lines[0]);
    assert!(lines[0].contains(r"x\ny"), "{}", lines[0]);
    assert_eq!(lines[1], r"[2024-01-15 10:00:00] >> AI: line one\nline two");
}

// ---------------------------------------------------------------------------
// Isolation
// ---------------------------------------------------------------------------

#[test]
fn malformed_tool_call_does_not_break_neighbours() {
    let records = minute_records(vec![
        PayloadBuilder::new().status("queued").build(),
        PayloadBuilder::new()
            .data(tool_call_repr("c", "broken", "{not json"))
            .build(),
        PayloadBuilder::new().status("completed").build(),
    ]);
    let out = renderer().render_feed(&records, FeedFormat::Text);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with("## SYS: Tool Call: broken"));
}

#[test]
fn wrong_typed_member_renders_as_error_line() {
    let records = minute_records(vec![json!({"data": {"status": ["a"]}})]);
    let out = renderer().render_feed(&records, FeedFormat::Text);
    assert!(out.starts_with("[2024-01-15 10:00:00] ** ERROR: Error parsing data:"), "{out}");
}

#[test]
fn render_time_mode_uses_payload_timestamp() {
    let mut cfg = Config::defaults();
    cfg.feed.timestamp = TimestampMode::RenderTime;
    let records = minute_records(vec![
        PayloadBuilder::new()
            .status("queued")
            .timestamp("2024-02-01T08:00:00")
            .build(),
    ]);
    let out = FeedRenderer::from_config(&cfg).render_feed(&records, FeedFormat::Text);
    assert_eq!(out, "[2024-02-01T08:00:00] !! STATUS: queued\n");
}
