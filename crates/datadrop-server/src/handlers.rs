use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use datadrop_core::{FeedFormat, Record, RecordId, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// `?limit=` on the feed routes.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub id: RecordId,
    pub received_at: DateTime<Utc>,
    pub message: &'static str,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Data receiver is running! Send POST requests to /upload"
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage.backend(),
    }))
}

pub async fn upload(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<UploadResponse>, ApiError> {
    let entry = state.renderer.classifier().classify(&payload);
    debug!(
        kind = %entry.kind,
        category = %entry.category,
        content = %entry.content,
        "upload classified"
    );

    let record = state.storage.persist(payload).await.map_err(|err| {
        error!(error = %err, "failed to persist upload");
        ApiError::Save(err)
    })?;
    info!(id = %record.id, "upload stored");

    Ok(Json(UploadResponse {
        status: "success",
        id: record.id,
        received_at: record.received_at,
        message: "Data saved successfully",
    }))
}

pub async fn feed_html(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Response {
    match recent(&state, &query).await {
        Ok(records) => Html(state.renderer.render_feed(&records, FeedFormat::Html)).into_response(),
        Err(err) => {
            let page = state
                .renderer
                .render_error_page(&ApiError::Feed(err).to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response()
        }
    }
}

pub async fn feed_text(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Response {
    match recent(&state, &query).await {
        Ok(records) => (
            [(header::CONTENT_TYPE, TEXT_PLAIN)],
            state.renderer.render_feed(&records, FeedFormat::Text),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, TEXT_PLAIN)],
            ApiError::Feed(err).to_string(),
        )
            .into_response(),
    }
}

pub async fn feed_json(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let records = recent(&state, &query).await.map_err(ApiError::Feed)?;
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        state.renderer.render_feed(&records, FeedFormat::Json),
    )
        .into_response())
}

async fn recent(state: &AppState, query: &FeedQuery) -> Result<Vec<Record>, StorageError> {
    let limit = state.feed.clamp_limit(query.limit);
    state.storage.list_recent(limit).await.inspect_err(|err| {
        error!(error = %err, limit, "failed to load feed");
    })
}
