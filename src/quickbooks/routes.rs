use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::oauth::ConnectState;
use super::service::CompanyInfo;
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;
use crate::prospects::storage as prospect_storage;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "realmId")]
    pub realm_id: Option<String>,
    pub error: Option<String>,
}

pub fn configure_quickbooks_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/quickbooks/connect", get(start_connect))
        .route("/api/quickbooks/callback", get(connect_callback))
        .route("/api/quickbooks/{company_id}/company-info", get(company_info))
        .route("/api/quickbooks/{company_id}", delete(disconnect))
}

async fn start_connect(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConnectParams>,
) -> Result<Response, ApiError> {
    let oauth = state.quickbooks.tokens().oauth();
    if !oauth.config().is_valid() {
        return Err(ApiError::Internal(
            "QuickBooks client credentials are not configured".to_string(),
        ));
    }

    let redirect_after = params.redirect.filter(|r| is_local_path(r));
    let connect_state = ConnectState::new(redirect_after);
    let auth_url = oauth.authorization_url(&connect_state.encode());

    log::debug!("Redirecting to Intuit consent screen");
    Ok(Redirect::temporary(&auth_url).into_response())
}

async fn connect_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    if let Some(error) = params.error {
        log::warn!("QuickBooks authorization denied: {error}");
        return Err(ApiError::Unauthorized(format!("authorization denied: {error}")));
    }

    let connect_state = params
        .state
        .as_deref()
        .and_then(ConnectState::decode)
        .ok_or_else(|| ApiError::Validation("missing or invalid state parameter".to_string()))?;
    if connect_state.is_expired(Utc::now()) {
        return Err(ApiError::Validation("connect request expired, start again".to_string()));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("missing authorization code".to_string()))?;
    let company_id = params
        .realm_id
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::Validation("missing realmId".to_string()))?;

    let tokens = state.quickbooks.tokens();
    let token = tokens.oauth().exchange_code(&code).await?;

    let id = company_id.clone();
    run_blocking(&state.conn, move |conn| prospect_storage::ensure_prospect(conn, &id)).await?;
    tokens
        .store_token(&token.into_stored(&company_id, Utc::now()))
        .await?;

    let info = match state.quickbooks.get_company_info(&company_id).await {
        Ok(info) => info,
        Err(e) => {
            log::warn!("Company info lookup for {company_id} failed after connect: {e}");
            CompanyInfo::default()
        }
    };

    let company_name = if info.company_name.trim().is_empty() {
        company_id.clone()
    } else {
        info.company_name.clone()
    };
    let id = company_id.clone();
    let name = company_name.clone();
    run_blocking(&state.conn, move |conn| {
        prospect_storage::upsert_connected_prospect(conn, &id, &name, info.email, info.phone)
    })
    .await?;

    log::info!("Connected QuickBooks company {company_id} ({company_name})");

    match connect_state.redirect_after {
        Some(target) => {
            let separator = if target.contains('?') { '&' } else { '?' };
            let url = format!(
                "{target}{separator}company_id={}",
                urlencoding::encode(&company_id)
            );
            Ok(Redirect::to(&url).into_response())
        }
        None => Ok(Json(json!({
            "company_id": company_id,
            "company_name": company_name,
            "connected": true,
        }))
        .into_response()),
    }
}

async fn company_info(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
) -> Result<Json<CompanyInfo>, ApiError> {
    let info = state.quickbooks.get_company_info(&company_id).await?;
    Ok(Json(info))
}

async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.quickbooks.tokens().disconnect(&company_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "company {company_id} has no QuickBooks connection"
        )))
    }
}

/// Only same-origin paths are accepted as post-connect redirects.
fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//")
}
