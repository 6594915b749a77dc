use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{render, ExportFormat};
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;
use crate::reports::storage::get_report;
use crate::reports::AuditDeck;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub report_id: Option<Uuid>,
    pub deck: Option<AuditDeck>,
    pub format: ExportFormat,
}

async fn resolve_deck(state: &AppState, req: ExportRequest) -> Result<AuditDeck, ApiError> {
    if let Some(deck) = req.deck {
        return Ok(deck);
    }
    let Some(report_id) = req.report_id else {
        return Err(ApiError::Validation(
            "either report_id or deck is required".to_string(),
        ));
    };
    let report = run_blocking(&state.conn, move |conn| get_report(conn, report_id)).await?;
    report
        .deck
        .ok_or_else(|| ApiError::Internal(format!("report {report_id} has an unreadable deck")))
}

pub async fn handle_export_audit_deck(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let format = req.format;
    let deck = resolve_deck(&state, req).await?;
    let file_name = format.file_name(&deck);

    let bytes = tokio::task::spawn_blocking(move || render(&deck, format))
        .await
        .map_err(|e| ApiError::Internal(format!("Export task failed: {e}")))??;

    log::info!("Exported {file_name} ({} bytes)", bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
