use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::checker::CheckStatus;
use crate::ledger::NotificationLedger;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<NotificationLedger>,
    pub status: Arc<CheckStatus>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(status))
        .route("/register", post(register))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct StatusResp {
    recipients: usize,
    notified_total: usize,
    last_check: Option<String>,
}

async fn status(State(state): State<AppState>) -> Json<StatusResp> {
    Json(StatusResp {
        recipients: state.ledger.recipient_count(),
        notified_total: state.ledger.notified_count(),
        last_check: state.status.last_check().map(|t| t.to_rfc3339()),
    })
}

#[derive(serde::Deserialize)]
struct RegisterReq {
    chat_id: i64,
}

#[derive(serde::Serialize)]
struct RegisterResp {
    added: bool,
    recipients: usize,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterReq>,
) -> Json<RegisterResp> {
    let added = state.ledger.register_recipient(body.chat_id);
    Json(RegisterResp {
        added,
        recipients: state.ledger.recipient_count(),
    })
}
