//! Domain-specific assertion macros for datadrop harnesses.
//!
//! These add the offending entry to the failure message, so a broken
//! classification shows the raw text that produced it.

// ---------------------------------------------------------------------------
// Entry assertions
// ---------------------------------------------------------------------------

/// Assert the `type` of a `ClassifiedEntry`.
///
/// ```rust
/// assert_kind!(entry, EntryKind::ToolCall);
/// ```
#[macro_export]
macro_rules! assert_kind {
    ($entry:expr, $kind:expr) => {{
        let entry: &datadrop::ClassifiedEntry = &$entry;
        let expected: datadrop::EntryKind = $kind;
        if entry.kind != expected {
            panic!(
                "assert_kind! failed:\n  expected: {}\n  actual:   {}\n  content:  {:?}\n  raw:      {:?}",
                expected,
                entry.kind,
                entry.content,
                entry.field("raw")
            );
        }
    }};
}

/// Assert the category of a `ClassifiedEntry`.
#[macro_export]
macro_rules! assert_category {
    ($entry:expr, $category:expr) => {{
        let entry: &datadrop::ClassifiedEntry = &$entry;
        let expected: datadrop::Category = $category;
        if entry.category != expected {
            panic!(
                "assert_category! failed:\n  expected: {}\n  actual:   {}\n  content:  {:?}",
                expected, entry.category, entry.content
            );
        }
    }};
}

/// Assert that an extracted field holds an expected value.
///
/// ```rust
/// assert_field!(entry, "function_name", "get_weather");
/// ```
#[macro_export]
macro_rules! assert_field {
    ($entry:expr, $key:expr, $($value:tt)+) => {{
        let entry: &datadrop::ClassifiedEntry = &$entry;
        let key: &str = $key;
        let expected = serde_json::json!($($value)+);
        match entry.field(key) {
            Some(actual) if *actual == expected => {}
            Some(actual) => panic!(
                "assert_field! failed:\n  entry.fields[{:?}]\n  expected: {}\n  actual:   {}",
                key, expected, actual
            ),
            None => panic!(
                "assert_field! failed: field {:?} not found.\n  Available: {:?}",
                key,
                entry.fields.keys().collect::<Vec<_>>()
            ),
        }
    }};
}

// ---------------------------------------------------------------------------
// Ordering assertions
// ---------------------------------------------------------------------------

/// Assert the ids of a record slice, in order.
///
/// ```rust
/// assert_ids!(recent, ["t3", "t2"]);
/// ```
#[macro_export]
macro_rules! assert_ids {
    ($records:expr, [$($id:expr),* $(,)?]) => {{
        let records = &$records;
        let actual: Vec<&str> = records.iter().map(|r: &datadrop::Record| r.id.as_str()).collect();
        let expected: Vec<&str> = vec![$($id),*];
        pretty_assertions::assert_eq!(actual, expected, "record order");
    }};
}
