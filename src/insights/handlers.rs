use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::storage::{analysis_record, insert_analyses, list_analyses, DbAiAnalysis};
use super::{AnalysisKind, CompanyProfile, FullAnalysis, Insight, TranscriptAnalysis};
use crate::activities::{log_activity, ActivityType};
use crate::benchmarks::find_benchmark;
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;
use crate::financials::{FinancialSnapshot, FinancialsError};
use crate::prospects::storage::find_prospect;
use crate::transcripts::storage::{get_transcript, latest_analyzed};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateInsightsRequest {
    pub transcript_id: Option<Uuid>,
    #[serde(default)]
    pub refresh_financials: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisHistoryQuery {
    pub analysis_type: Option<String>,
    pub limit: Option<i64>,
}

/// Prospect fields plus its industry benchmark, when one is on file.
pub fn load_company_profile(
    conn: &mut PgConnection,
    company_id: &str,
) -> QueryResult<CompanyProfile> {
    let prospect = find_prospect(conn, company_id)?.ok_or(diesel::result::Error::NotFound)?;
    let benchmark = match prospect.industry.as_deref() {
        Some(industry) => find_benchmark(conn, industry)?,
        None => None,
    };
    Ok(CompanyProfile {
        company_id: Some(prospect.company_id),
        name: prospect.company_name,
        industry: prospect.industry,
        contact_name: prospect.contact_name,
        benchmark,
    })
}

/// Fresh snapshot when QuickBooks is reachable, otherwise the last one stored.
pub async fn snapshot_for_analysis(
    state: &AppState,
    company_id: &str,
    refresh: bool,
) -> Result<FinancialSnapshot, ApiError> {
    match state
        .snapshots
        .get_or_refresh(company_id, Utc::now(), refresh)
        .await
    {
        Ok(snapshot) => Ok(snapshot),
        Err(FinancialsError::QuickBooks(e)) => {
            log::warn!("QuickBooks unavailable for {company_id}, using stored snapshot: {e}");
            state
                .snapshots
                .latest(company_id)
                .await?
                .ok_or_else(|| ApiError::from(e))
        }
        Err(e) => Err(e.into()),
    }
}

/// Stored analysis of the given transcript, or of the most recent analyzed one.
pub async fn stored_transcript_analysis(
    state: &AppState,
    company_id: &str,
    transcript_id: Option<Uuid>,
) -> Result<Option<Insight<TranscriptAnalysis>>, ApiError> {
    let company = company_id.to_string();
    let row = run_blocking(&state.conn, move |conn| match transcript_id {
        Some(id) => get_transcript(conn, id).map(Some),
        None => latest_analyzed(conn, &company),
    })
    .await?;

    match row {
        Some(row) if row.company_id != company_id => Err(ApiError::Validation(format!(
            "transcript {} does not belong to company {company_id}",
            row.id
        ))),
        Some(row) => Ok(row.analysis_envelope().map(Insight::from)),
        None => Ok(None),
    }
}

pub async fn handle_generate_insights(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
    body: Bytes,
) -> Result<Json<FullAnalysis>, ApiError> {
    let req: GenerateInsightsRequest = if body.is_empty() {
        GenerateInsightsRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("invalid request body: {e}")))?
    };

    let id = company_id.clone();
    let company = run_blocking(&state.conn, move |conn| load_company_profile(conn, &id)).await?;
    let snapshot = snapshot_for_analysis(&state, &company_id, req.refresh_financials).await?;
    let transcript = stored_transcript_analysis(&state, &company_id, req.transcript_id).await?;

    let analysis = state
        .insights
        .run_full_analysis(transcript, &snapshot, &company)
        .await;

    let rows = full_analysis_records(&company_id, &analysis);
    let fallbacks = rows.iter().filter(|r| r.source == "fallback").count();
    let id = company_id.clone();
    run_blocking(&state.conn, move |conn| {
        insert_analyses(conn, &rows)?;
        log_activity(
            conn,
            &id,
            ActivityType::Note,
            "Generated AI business insights".to_string(),
        );
        Ok(())
    })
    .await?;

    if fallbacks > 0 {
        log::warn!("Insights for {company_id} include {fallbacks} fallback section(s)");
    }
    Ok(Json(analysis))
}

fn full_analysis_records(company_id: &str, analysis: &FullAnalysis) -> Vec<DbAiAnalysis> {
    vec![
        analysis_record(
            company_id,
            AnalysisKind::FinancialIntelligence,
            &Insight::from(analysis.financial_intelligence.clone()),
        ),
        analysis_record(
            company_id,
            AnalysisKind::BusinessInsights,
            &Insight::from(analysis.business_insights.clone()),
        ),
        analysis_record(
            company_id,
            AnalysisKind::TalkingPoints,
            &Insight::from(analysis.talking_points.clone()),
        ),
        analysis_record(
            company_id,
            AnalysisKind::ClosingStrategies,
            &Insight::from(analysis.closing_strategies.clone()),
        ),
    ]
}

pub async fn handle_list_analyses(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
    Query(query): Query<AnalysisHistoryQuery>,
) -> Result<Json<Vec<DbAiAnalysis>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let analyses = run_blocking(&state.conn, move |conn| {
        list_analyses(conn, &company_id, query.analysis_type.as_deref(), limit)
    })
    .await?;
    Ok(Json(analyses))
}
