pub mod handlers;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use types::{derive_workflow_stage, Prospect, StageSignals, WorkflowStage};

pub fn configure_prospects_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/prospects",
            get(handlers::handle_list_prospects).post(handlers::handle_create_prospect),
        )
        .route(
            "/api/prospects/{company_id}",
            get(handlers::handle_get_prospect)
                .put(handlers::handle_update_prospect)
                .delete(handlers::handle_delete_prospect),
        )
}
