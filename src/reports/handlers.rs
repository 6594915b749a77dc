use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::deck::build_audit_deck;
use super::storage::{self, ReportSummary, StoredReport};
use crate::activities::{log_activity, ActivityType};
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;
use crate::insights::handlers::{
    load_company_profile, snapshot_for_analysis, stored_transcript_analysis,
};
use crate::insights::storage::analysis_record;
use crate::insights::AnalysisKind;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateDeckQuery {
    pub transcript_id: Option<Uuid>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListReportsQuery {
    pub company_id: Option<String>,
    pub limit: Option<i64>,
}

pub async fn handle_generate_audit_deck(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
    Query(query): Query<GenerateDeckQuery>,
) -> Result<(StatusCode, Json<StoredReport>), ApiError> {
    let id = company_id.clone();
    let company = run_blocking(&state.conn, move |conn| load_company_profile(conn, &id)).await?;
    let snapshot = snapshot_for_analysis(&state, &company_id, query.refresh).await?;
    let transcript = stored_transcript_analysis(&state, &company_id, query.transcript_id).await?;

    let engine = &state.insights;
    let transcript_value = transcript
        .as_ref()
        .map(|t| t.value().clone())
        .unwrap_or_default();

    let financial = engine.analyze_financial_data(&snapshot, &company).await;
    let insights = engine
        .generate_business_insights(&transcript_value, financial.value(), &company)
        .await;
    let intelligence = engine
        .generate_audit_deck_intelligence(
            &transcript_value,
            financial.value(),
            insights.value(),
            &company,
        )
        .await;

    let mut deck = build_audit_deck(
        &company,
        &snapshot,
        transcript.as_ref().map(|t| t.value()),
        &intelligence,
        Utc::now(),
    );
    if transcript.as_ref().is_some_and(|t| t.is_fallback()) {
        deck.note_fallback(AnalysisKind::TranscriptAnalysis);
    }
    if financial.is_fallback() {
        deck.note_fallback(AnalysisKind::FinancialIntelligence);
    }
    if insights.is_fallback() {
        deck.note_fallback(AnalysisKind::BusinessInsights);
    }

    let records = vec![
        analysis_record(&company_id, AnalysisKind::FinancialIntelligence, &financial),
        analysis_record(&company_id, AnalysisKind::BusinessInsights, &insights),
        analysis_record(&company_id, AnalysisKind::AuditDeckIntelligence, &intelligence),
    ];

    let report = run_blocking(&state.conn, move |conn| {
        let report = storage::store_audit_deck(conn, &deck, &records)?;
        log_activity(
            conn,
            &report.company_id,
            ActivityType::Proposal,
            format!("Generated audit deck \"{}\"", report.title),
        );
        Ok(report)
    })
    .await?;

    log::info!("Generated audit deck {} for company {company_id}", report.id);
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn handle_get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredReport>, ApiError> {
    let report = run_blocking(&state.conn, move |conn| storage::get_report(conn, id)).await?;
    Ok(Json(report))
}

pub async fn handle_list_reports(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<Vec<ReportSummary>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let reports = run_blocking(&state.conn, move |conn| {
        storage::list_reports(conn, query.company_id.as_deref(), limit)
    })
    .await?;
    Ok(Json(reports))
}
