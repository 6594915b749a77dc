//! Audit deck generation and storage.

pub mod deck;
pub mod handlers;
pub mod storage;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use deck::{build_audit_deck, AiProvenance, AuditDeck, BenchmarkComparison, DeckFinancials};
pub use storage::{ReportSummary, StoredReport};

pub fn configure_reports_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/reports/audit-deck/{company_id}",
            post(handlers::handle_generate_audit_deck),
        )
        .route("/api/reports", get(handlers::handle_list_reports))
        .route("/api/reports/{id}", get(handlers::handle_get_report))
}
