//! Sales activity log per prospect (calls, emails, meetings, notes, proposals).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::error::ApiError;
use crate::core::shared::schema::sales_activities;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    Note,
    Proposal,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Meeting => "meeting",
            Self::Note => "note",
            Self::Proposal => "proposal",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(Self::Call),
            "email" => Ok(Self::Email),
            "meeting" => Ok(Self::Meeting),
            "note" => Ok(Self::Note),
            "proposal" => Ok(Self::Proposal),
            other => Err(format!("unknown activity type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = sales_activities)]
pub struct DbSalesActivity {
    pub id: Uuid,
    pub company_id: String,
    pub activity_type: String,
    pub description: String,
    pub outcome: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesActivity {
    pub id: Uuid,
    pub company_id: String,
    pub activity_type: ActivityType,
    pub description: String,
    pub outcome: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

fn db_activity_to_activity(row: DbSalesActivity) -> SalesActivity {
    SalesActivity {
        id: row.id,
        company_id: row.company_id,
        activity_type: row.activity_type.parse().unwrap_or(ActivityType::Note),
        description: row.description,
        outcome: row.outcome,
        occurred_at: row.occurred_at,
        created_at: row.created_at,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateActivityRequest {
    pub company_id: String,
    pub activity_type: ActivityType,
    pub description: String,
    pub outcome: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListActivitiesQuery {
    pub company_id: Option<String>,
    pub activity_type: Option<ActivityType>,
    pub limit: Option<i64>,
}

pub fn insert_activity(
    conn: &mut PgConnection,
    req: CreateActivityRequest,
) -> QueryResult<SalesActivity> {
    let now = Utc::now();
    let row = DbSalesActivity {
        id: Uuid::new_v4(),
        company_id: req.company_id,
        activity_type: req.activity_type.as_str().to_string(),
        description: req.description,
        outcome: req.outcome,
        occurred_at: req.occurred_at.unwrap_or(now),
        created_at: now,
    };
    diesel::insert_into(sales_activities::table)
        .values(&row)
        .execute(conn)?;
    Ok(db_activity_to_activity(row))
}

pub fn list_activities(
    conn: &mut PgConnection,
    query: &ListActivitiesQuery,
) -> QueryResult<Vec<SalesActivity>> {
    let mut db_query = sales_activities::table.into_boxed();
    if let Some(ref company_id) = query.company_id {
        db_query = db_query.filter(sales_activities::company_id.eq(company_id.clone()));
    }
    if let Some(activity_type) = query.activity_type {
        db_query = db_query.filter(sales_activities::activity_type.eq(activity_type.as_str()));
    }

    let rows: Vec<DbSalesActivity> = db_query
        .order(sales_activities::occurred_at.desc())
        .limit(query.limit.unwrap_or(100).clamp(1, 500))
        .load(conn)?;
    Ok(rows.into_iter().map(db_activity_to_activity).collect())
}

/// Best-effort audit trail entry written alongside other operations.
pub fn log_activity(
    conn: &mut PgConnection,
    company_id: &str,
    activity_type: ActivityType,
    description: String,
) {
    let req = CreateActivityRequest {
        company_id: company_id.to_string(),
        activity_type,
        description,
        outcome: None,
        occurred_at: None,
    };
    if let Err(e) = insert_activity(conn, req) {
        log::warn!("Failed to record {activity_type} activity for {company_id}: {e}");
    }
}

pub fn configure_activities_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/activities",
        get(handle_list_activities).post(handle_create_activity),
    )
}

async fn handle_list_activities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListActivitiesQuery>,
) -> Result<Json<Vec<SalesActivity>>, ApiError> {
    let activities = run_blocking(&state.conn, move |conn| list_activities(conn, &query)).await?;
    Ok(Json(activities))
}

async fn handle_create_activity(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<SalesActivity>), ApiError> {
    if req.company_id.trim().is_empty() {
        return Err(ApiError::Validation("company_id is required".to_string()));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::Validation("description is required".to_string()));
    }
    let activity = run_blocking(&state.conn, move |conn| insert_activity(conn, req)).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}
