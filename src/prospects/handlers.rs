use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;

use super::storage;
use super::types::{CreateProspectRequest, ListProspectsQuery, Prospect, UpdateProspectRequest};

pub async fn handle_list_prospects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProspectsQuery>,
) -> Result<Json<Vec<Prospect>>, ApiError> {
    let prospects = run_blocking(&state.conn, move |conn| storage::list_prospects(conn, &query)).await?;
    Ok(Json(prospects))
}

pub async fn handle_create_prospect(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProspectRequest>,
) -> Result<(StatusCode, Json<Prospect>), ApiError> {
    if req.company_id.trim().is_empty() {
        return Err(ApiError::Validation("company_id is required".to_string()));
    }
    if req.company_name.trim().is_empty() {
        return Err(ApiError::Validation("company_name is required".to_string()));
    }

    let company_id = req.company_id.clone();
    let prospect = run_blocking(&state.conn, move |conn| storage::insert_prospect(conn, req))
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::Conflict(format!("prospect {company_id} already exists"))
            } else {
                e.into()
            }
        })?;
    log::info!("Created prospect {}", prospect.company_id);
    Ok((StatusCode::CREATED, Json(prospect)))
}

pub async fn handle_get_prospect(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
) -> Result<Json<Prospect>, ApiError> {
    let prospect = run_blocking(&state.conn, move |conn| storage::get_prospect(conn, &company_id)).await?;
    Ok(Json(prospect))
}

pub async fn handle_update_prospect(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
    Json(req): Json<UpdateProspectRequest>,
) -> Result<Json<Prospect>, ApiError> {
    if req.company_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::Validation("company_name cannot be empty".to_string()));
    }
    let prospect = run_blocking(&state.conn, move |conn| {
        storage::update_prospect(conn, &company_id, req)
    })
    .await?;
    Ok(Json(prospect))
}

pub async fn handle_delete_prospect(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = company_id.clone();
    let deleted = run_blocking(&state.conn, move |conn| storage::delete_prospect(conn, &id)).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("prospect {company_id} not found")));
    }
    log::info!("Deleted prospect {company_id}");
    Ok(StatusCode::NO_CONTENT)
}
