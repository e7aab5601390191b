//! datadrop-server — HTTP ingestion and feed routes.
//!
//! ## Endpoint Map
//!
//! | Method | Path        | Auth                      | Description                    |
//! |--------|-------------|---------------------------|--------------------------------|
//! | GET    | `/`         | none                      | Liveness message               |
//! | GET    | `/health`   | none                      | Status, version, backend name  |
//! | POST   | `/upload`   | API key                   | Persist an arbitrary JSON body |
//! | GET    | `/feed`     | API key if `protect_feed` | HTML feed                      |
//! | GET    | `/feed.txt` | API key if `protect_feed` | Plain-text feed                |
//! | GET    | `/api/feed` | API key if `protect_feed` | JSON feed                      |

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use datadrop_core::config::{AuthConfig, FeedConfig, ServerConfig};
use datadrop_core::{Config, FeedRenderer, Storage};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared, read-only state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub renderer: Arc<FeedRenderer>,
    pub feed: Arc<FeedConfig>,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            renderer: Arc::new(FeedRenderer::from_config(config)),
            feed: Arc::new(config.feed.clone()),
            auth: Arc::new(config.auth.clone()),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let feed = Router::new()
        .route("/feed", get(handlers::feed_html))
        .route("/feed.txt", get(handlers::feed_text))
        .route("/api/feed", get(handlers::feed_json));
    let feed = if state.auth.protect_feed {
        feed.route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.auth),
            auth::require_api_key,
        ))
    } else {
        feed
    };

    let upload = post(handlers::upload).route_layer(middleware::from_fn_with_state(
        Arc::clone(&state.auth),
        auth::require_api_key,
    ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/upload", upload)
        .merge(feed)
        .with_state(state)
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(build_cors(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring malformed CORS origin");
                    None
                }
            })
            .collect();
        cors.allow_origin(parsed)
    }
}

/// Bind `bind` and serve until Ctrl-C.
pub async fn serve(config: &Config, bind: SocketAddr, storage: Arc<dyn Storage>) -> anyhow::Result<()> {
    let app = router(AppState::new(config, storage), &config.server);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "datadrop listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "cannot listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
