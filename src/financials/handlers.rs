use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::FinancialSnapshot;
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FinancialsQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FinancialsResponse {
    #[serde(flatten)]
    pub snapshot: FinancialSnapshot,
    pub cached: bool,
}

pub async fn handle_get_financials(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
    Query(query): Query<FinancialsQuery>,
) -> Result<Json<FinancialsResponse>, ApiError> {
    let now = Utc::now();
    let snapshot = state
        .snapshots
        .get_or_refresh(&company_id, now, query.refresh)
        .await?;
    let cached = snapshot.created_at < now;
    Ok(Json(FinancialsResponse { snapshot, cached }))
}

pub async fn handle_financial_history(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<FinancialSnapshot>>, ApiError> {
    let snapshots = state
        .snapshots
        .history(&company_id, query.limit.unwrap_or(30))
        .await?;
    Ok(Json(snapshots))
}
