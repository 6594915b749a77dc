//! Industry benchmark averages used to put a prospect's ratios in context.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::shared::error::ApiError;
use crate::core::shared::schema::industry_benchmarks;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;

#[derive(Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = industry_benchmarks)]
pub struct IndustryBenchmark {
    pub industry: String,
    pub avg_profit_margin: f64,
    pub avg_debt_to_equity: f64,
    pub avg_revenue_growth: f64,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertBenchmarkRequest {
    pub avg_profit_margin: f64,
    pub avg_debt_to_equity: f64,
    pub avg_revenue_growth: f64,
    pub notes: Option<String>,
}

/// Benchmarks are keyed by lowercased, trimmed industry name.
pub fn normalize_industry(industry: &str) -> String {
    industry.trim().to_lowercase()
}

pub fn find_benchmark(
    conn: &mut PgConnection,
    industry: &str,
) -> QueryResult<Option<IndustryBenchmark>> {
    industry_benchmarks::table
        .find(normalize_industry(industry))
        .first(conn)
        .optional()
}

pub fn list_benchmarks(conn: &mut PgConnection) -> QueryResult<Vec<IndustryBenchmark>> {
    industry_benchmarks::table
        .order(industry_benchmarks::industry.asc())
        .load(conn)
}

pub fn upsert_benchmark(
    conn: &mut PgConnection,
    industry: &str,
    req: UpsertBenchmarkRequest,
) -> QueryResult<IndustryBenchmark> {
    let row = IndustryBenchmark {
        industry: normalize_industry(industry),
        avg_profit_margin: req.avg_profit_margin,
        avg_debt_to_equity: req.avg_debt_to_equity,
        avg_revenue_growth: req.avg_revenue_growth,
        notes: req.notes,
        updated_at: Utc::now(),
    };
    diesel::insert_into(industry_benchmarks::table)
        .values(&row)
        .on_conflict(industry_benchmarks::industry)
        .do_update()
        .set(&row)
        .execute(conn)?;
    Ok(row)
}

pub fn configure_benchmarks_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/benchmarks", get(handle_list_benchmarks))
        .route(
            "/api/benchmarks/{industry}",
            get(handle_get_benchmark).put(handle_upsert_benchmark),
        )
}

async fn handle_list_benchmarks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IndustryBenchmark>>, ApiError> {
    let benchmarks = run_blocking(&state.conn, list_benchmarks).await?;
    Ok(Json(benchmarks))
}

async fn handle_get_benchmark(
    State(state): State<Arc<AppState>>,
    Path(industry): Path<String>,
) -> Result<Json<IndustryBenchmark>, ApiError> {
    let key = industry.clone();
    run_blocking(&state.conn, move |conn| find_benchmark(conn, &key))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no benchmark for industry '{industry}'")))
}

async fn handle_upsert_benchmark(
    State(state): State<Arc<AppState>>,
    Path(industry): Path<String>,
    Json(req): Json<UpsertBenchmarkRequest>,
) -> Result<Json<IndustryBenchmark>, ApiError> {
    if normalize_industry(&industry).is_empty() {
        return Err(ApiError::Validation("industry is required".to_string()));
    }
    if !(req.avg_profit_margin.is_finite()
        && req.avg_debt_to_equity.is_finite()
        && req.avg_revenue_growth.is_finite())
    {
        return Err(ApiError::Validation("benchmark values must be finite numbers".to_string()));
    }
    let benchmark = run_blocking(&state.conn, move |conn| {
        upsert_benchmark(conn, &industry, req)
    })
    .await?;
    log::info!("Updated benchmark for industry '{}'", benchmark.industry);
    Ok(Json(benchmark))
}
