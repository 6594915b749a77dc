//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let pool = state.conn.clone();
    let db_ok = tokio::task::spawn_blocking(move || pool.get().is_ok())
        .await
        .unwrap_or(false);

    let status = if db_ok { "healthy" } else { "degraded" };
    let code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "ledgr",
            "version": env!("CARGO_PKG_VERSION"),
            "database": db_ok,
            "quickbooks_configured": state.config.quickbooks.is_valid(),
            "llm_model": state.llm_provider.model(),
        })),
    )
}

pub async fn health_check_simple() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "ledgr",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
