//! Financial snapshots
//!
//! Each pull from QuickBooks is stored as an append-only snapshot with derived
//! ratios. Reads go through [`SnapshotCache`], which serves the latest
//! snapshot while it is younger than the configured TTL (24 hours by default).

pub mod cache;
pub mod handlers;
pub mod storage;

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::error::{ApiError, StorageError};
use crate::core::shared::state::AppState;
use crate::quickbooks::QuickBooksError;

pub use cache::{
    build_snapshot, compute_ratios, is_fresh, FinancialSource, Ratios, RawReports, SnapshotCache,
    SnapshotStore,
};
pub use storage::PgSnapshotStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub id: Uuid,
    pub company_id: String,
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    pub profit_margin: f64,
    pub debt_to_equity: f64,
    #[serde(default)]
    pub raw_reports: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum FinancialsError {
    #[error(transparent)]
    QuickBooks(#[from] QuickBooksError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<FinancialsError> for ApiError {
    fn from(err: FinancialsError) -> Self {
        match err {
            FinancialsError::QuickBooks(e) => e.into(),
            FinancialsError::Storage(e) => e.into(),
        }
    }
}

pub fn configure_financials_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/financials/{company_id}", get(handlers::handle_get_financials))
        .route(
            "/api/financials/{company_id}/history",
            get(handlers::handle_financial_history),
        )
}
