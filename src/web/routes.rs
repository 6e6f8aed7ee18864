use crate::bot::{handler, Bot};
use crate::error::{AppError, AppResult};
use crate::telegram::Update;
use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

const WEBHOOK_PREFIX: &str = "/webhook/";

/// Application state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    /// Path segment Telegram must present; the bot token
    pub webhook_token: Arc<str>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'static str>,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "Bot is running",
        service: Some("Telegram Whisper Bot"),
    })
}

/// Telegram webhook. The token is checked before the body is parsed, and the
/// update is processed on its own task so Telegram gets an immediate
/// acknowledgment.
pub async fn webhook(
    Path(token): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<StatusResponse>> {
    if token != *state.webhook_token {
        warn!("Rejected webhook call with invalid token");
        return Err(AppError::InvalidWebhookToken);
    }

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        warn!("Malformed webhook update: {}", e);
        e
    })?;

    debug!("Received update {}", update.update_id);
    let bot = state.bot.clone();
    tokio::spawn(async move { handler::handle_update(&bot, update).await });

    Ok(Json(StatusResponse {
        status: "ok",
        service: None,
    }))
}

/// Request path with the webhook token segment masked. The token is the bot
/// credential and must not reach the logs.
fn redact_path(path: &str) -> &str {
    if path.starts_with(WEBHOOK_PREFIX) {
        "/webhook/<token>"
    } else {
        path
    }
}

/// Create the web router
pub fn create_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::debug_span!(
            "request",
            method = %request.method(),
            path = %redact_path(request.uri().path()),
        )
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook/{token}", post(webhook))
        .layer(trace)
        .with_state(state)
}
