//! HTTP surface of the push agent daemon.
//!
//! Stands in for the platform: pushes and clicks posted here are forwarded to
//! the agent's event queue, and the in-memory host's tray and windows can be
//! inspected.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::AgentEvent;
use crate::host::memory::InMemoryHost;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub events: mpsc::Sender<AgentEvent>,
    pub host: Arc<InMemoryHost>,
}

/// Body of `POST /clients`.
#[derive(Debug, Deserialize)]
struct RegisterClient {
    url: String,
    #[serde(default = "default_controlled")]
    controlled: bool,
}

const fn default_controlled() -> bool {
    true
}

/// Build the daemon router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/push", post(handle_push))
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/click", post(handle_click))
        .route("/clients", get(list_clients).post(register_client))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn enqueue(events: &mpsc::Sender<AgentEvent>, event: AgentEvent) -> StatusCode {
    let kind = event.kind();
    if events.send(event).await.is_err() {
        warn!(event = kind, "Agent event queue closed");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::ACCEPTED
}

/// Push endpoint - the raw body is the push payload.
async fn handle_push(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    info!(len = body.len(), "Received push via HTTP");
    let data = (!body.is_empty()).then(|| body.to_vec());
    enqueue(&state.events, AgentEvent::Push { data }).await
}

async fn list_notifications(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.host.notifications().await)
}

/// Click endpoint - routes the notification's stored URL.
async fn handle_click(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let Some(notification) = state.host.notification(id).await else {
        return StatusCode::NOT_FOUND;
    };
    info!(notification_id = %id, "Received click via HTTP");
    enqueue(&state.events, AgentEvent::NotificationClick { notification }).await
}

async fn list_clients(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.host.clients().await)
}

async fn register_client(
    State(state): State<AppState>,
    Json(request): Json<RegisterClient>,
) -> impl IntoResponse {
    let client = state.host.add_client(request.url, request.controlled).await;
    (StatusCode::CREATED, Json(client))
}
