//! HTTP surface - Webhook receiver and health endpoints

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::services::{BotService, WebhookOutcome};

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<BotService>,
}

impl AppState {
    pub fn new(bot: Arc<BotService>) -> Self {
        Self { bot }
    }
}

/// Creates the router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/about", get(about))
        .route("/test", get(alive))
        .with_state(state)
}

/// Serve until `cancel` fires
pub async fn serve(
    addr: &str,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

async fn webhook(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match state.bot.handle_webhook(&body).await {
        Ok(WebhookOutcome::Replied) => StatusCode::OK,
        Ok(WebhookOutcome::Ignored) => StatusCode::ACCEPTED,
        Err(e) => {
            tracing::warn!("Webhook delivery failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn about(State(state): State<AppState>) -> Response {
    match state.bot.messenger().bot_identity().await {
        Ok(person) => Json(person).into_response(),
        Err(e) => {
            tracing::warn!("Could not fetch bot identity: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn alive() -> &'static str {
    "I am alive!"
}
