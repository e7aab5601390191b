//! Configuration types for datadrop.
//!
//! [`Config::load`] layers, lowest priority first: the embedded defaults, an
//! optional TOML file, `DATADROP__SECTION__KEY` environment variables, and
//! finally the legacy `API_KEY` variable when no key was configured otherwise.
//! [`Config::defaults`] returns the embedded defaults without touching the
//! filesystem or the environment (useful in tests).
//!
//! The result is built once at startup and handed to the server and CLI;
//! nothing below this module reads the environment.

use crate::extract::Extractor;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r###"
[server]
bind           = "0.0.0.0:8000"
cors_origins   = ["*"]
max_body_bytes = 2097152

[auth]
enabled      = true
header       = "X-API-Key"
protect_feed = false

[storage]
backend     = "file"
dir         = "data"
sqlite_path = "data/records.db"

[feed]
limit            = 50
max_limit        = 500
timestamp        = "received"
timestamp_format = "%Y-%m-%d %H:%M:%S"
title            = "datadrop"
default_prefix   = "-- LOG:"

[feed.prefixes]
ai_response   = ">> AI:"
system_action = "## SYS:"
system_status = "!! STATUS:"
error         = "** ERROR:"
unknown       = "?? LOG:"

[classifier]
extractor = "scanner"
"###;

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "datadrop.toml";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
    pub classifier: ClassifierConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
}

/// `[auth]` section.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Request header carrying the key.
    pub header: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Also require the key on the feed routes.
    pub protect_feed: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("header", &self.header)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("protect_feed", &self.protect_feed)
            .finish()
    }
}

/// Where records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    File,
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the file backend.
    pub dir: PathBuf,
    /// Database file for the sqlite backend.
    pub sqlite_path: PathBuf,
}

/// Which timestamp the feed shows next to each entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampMode {
    /// The record's stored `received_at`.
    #[default]
    Received,
    /// The payload's own `timestamp` member, else the time of rendering.
    RenderTime,
}

/// `[feed]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Records shown when the request does not ask for a count.
    pub limit: usize,
    /// Upper bound for a requested count.
    pub max_limit: usize,
    pub timestamp: TimestampMode,
    /// chrono `strftime` format for stored timestamps.
    pub timestamp_format: String,
    pub title: String,
    /// Prefix for categories missing from `prefixes`.
    pub default_prefix: String,
    /// Category name → display prefix.
    pub prefixes: BTreeMap<String, String>,
}

impl FeedConfig {
    /// Clamp a requested record count into `1..=max_limit`, falling back to
    /// the configured default.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.limit).clamp(1, self.max_limit.max(1))
    }
}

/// `[classifier]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub extractor: Extractor,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load configuration, layered on top of the built-in defaults.
    ///
    /// `path` is required to exist when given. Without it,
    /// [`DEFAULT_CONFIG_FILE`] in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let mut cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("DATADROP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if cfg.auth.api_key.is_none() {
            cfg.auth.api_key = std::env::var("API_KEY").ok().filter(|key| !key.is_empty());
        }
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        Self::from_toml_str("").expect("built-in default config must deserialize correctly")
    }

    /// Parse `src` layered over the built-in defaults.
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(src, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Reject combinations the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.feed.limit == 0 || self.feed.max_limit == 0 {
            anyhow::bail!("feed.limit and feed.max_limit must be at least 1");
        }
        if self.feed.limit > self.feed.max_limit {
            anyhow::bail!(
                "feed.limit ({}) exceeds feed.max_limit ({})",
                self.feed.limit,
                self.feed.max_limit
            );
        }
        if let Some(origin) = self.server.cors_origins.iter().find(|o| !is_valid_origin(o)) {
            anyhow::bail!("server.cors_origins: {origin:?} is not \"*\" or an http(s) origin");
        }
        if self.auth.header.trim().is_empty() {
            anyhow::bail!("auth.header must not be empty");
        }
        if self.auth.enabled && self.auth.api_key.as_deref().map_or(true, str::is_empty) {
            anyhow::bail!(
                "auth is enabled but no API key is set (auth.api_key, DATADROP__AUTH__API_KEY or API_KEY)"
            );
        }
        Ok(())
    }
}

/// `*`, or a scheme and host with no path and nothing a header cannot carry.
fn is_valid_origin(origin: &str) -> bool {
    if origin == "*" {
        return true;
    }
    let Some(rest) = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))
    else {
        return false;
    };
    !rest.is_empty()
        && !rest.contains('/')
        && rest.chars().all(|c| c.is_ascii_graphic())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
