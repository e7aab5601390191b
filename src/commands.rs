//! Bodies of the `datadrop` subcommands, kept out of `main` so they can be
//! driven from tests.

use anyhow::Context;
use datadrop_core::{Classifier, Config, FeedFormat, FeedRenderer, Storage};
use std::net::SocketAddr;
use std::path::Path;

/// `datadrop serve`: validate the config, open storage, run until Ctrl-C.
pub async fn serve(config: &Config, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    config.validate()?;
    let storage = datadrop_store::open(&config.storage)
        .await
        .context("failed to open storage")?;
    let bind = bind.unwrap_or(config.server.bind);
    datadrop_server::serve(config, bind, storage).await
}

/// `datadrop feed`: render the most recent records from `storage`.
pub async fn feed(
    config: &Config,
    storage: &dyn Storage,
    limit: Option<usize>,
    format: FeedFormat,
) -> anyhow::Result<String> {
    let limit = config.feed.clamp_limit(limit);
    let records = storage
        .list_recent(limit)
        .await
        .context("failed to load feed")?;
    tracing::debug!(count = records.len(), ?format, "rendering feed");
    Ok(FeedRenderer::from_config(config).render_feed(&records, format))
}

/// `datadrop classify`: classify one JSON document and return the entry as
/// pretty JSON.
pub fn classify(config: &Config, input: &str) -> anyhow::Result<String> {
    let payload: serde_json::Value =
        serde_json::from_str(input).context("input is not valid JSON")?;
    let entry = Classifier::new(config.classifier.extractor).classify(&payload);
    Ok(serde_json::to_string_pretty(&entry)?)
}

/// Read a payload from `path`, or stdin when absent.
pub fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin"),
    }
}
