use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::storage::{self, DbCallTranscript};
use super::{CallTranscript, ListTranscriptsQuery, UploadTranscriptRequest};
use crate::activities::{log_activity, ActivityType};
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::run_blocking;
use crate::insights::storage::analysis_record;
use crate::insights::{AnalysisKind, InsightEnvelope, TranscriptAnalysis};
use crate::prospects::storage::find_prospect;

pub async fn handle_upload_transcript(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadTranscriptRequest>,
) -> Result<(StatusCode, Json<CallTranscript>), ApiError> {
    req.validate().map_err(ApiError::Validation)?;

    let transcript = run_blocking(&state.conn, move |conn| {
        if find_prospect(conn, &req.company_id)?.is_none() {
            return Err(diesel::result::Error::NotFound);
        }
        let row = DbCallTranscript {
            id: Uuid::new_v4(),
            company_id: req.company_id,
            file_name: req.file_name,
            file_type: req.file_type,
            file_size: Some(req.content.len() as i64),
            participants: req.participants,
            call_date: req.call_date,
            content: req.content,
            analysis: None,
            sales_score: None,
            analyzed_at: None,
            created_at: Utc::now(),
        };
        storage::insert_transcript(conn, &row)?;
        log_activity(
            conn,
            &row.company_id,
            ActivityType::Call,
            format!("Uploaded call transcript {}", row.file_name),
        );
        Ok(row)
    })
    .await?;

    log::info!(
        "Stored transcript {} for company {}",
        transcript.id,
        transcript.company_id
    );
    Ok((StatusCode::CREATED, Json(CallTranscript::from_db(transcript, true))))
}

pub async fn handle_list_transcripts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTranscriptsQuery>,
) -> Result<Json<Vec<CallTranscript>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let rows = run_blocking(&state.conn, move |conn| {
        storage::list_transcripts(conn, query.company_id.as_deref(), limit)
    })
    .await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| CallTranscript::from_db(row, false))
            .collect(),
    ))
}

pub async fn handle_get_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CallTranscript>, ApiError> {
    let row = run_blocking(&state.conn, move |conn| storage::get_transcript(conn, id)).await?;
    Ok(Json(CallTranscript::from_db(row, true)))
}

pub async fn handle_delete_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = run_blocking(&state.conn, move |conn| storage::delete_transcript(conn, id)).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("transcript {id} not found")))
    }
}

pub async fn handle_analyze_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InsightEnvelope<TranscriptAnalysis>>, ApiError> {
    let (transcript, company_name) = run_blocking(&state.conn, move |conn| {
        let transcript = storage::get_transcript(conn, id)?;
        let name = find_prospect(conn, &transcript.company_id)?
            .map(|p| p.company_name)
            .unwrap_or_else(|| transcript.company_id.clone());
        Ok((transcript, name))
    })
    .await?;

    let insight = state
        .insights
        .analyze_call_transcript(&transcript.content, &company_name)
        .await;

    let record = analysis_record(
        &transcript.company_id,
        AnalysisKind::TranscriptAnalysis,
        &insight,
    );
    let envelope: InsightEnvelope<TranscriptAnalysis> = insight.into();

    let stored = envelope.clone();
    let company_id = transcript.company_id.clone();
    run_blocking(&state.conn, move |conn| {
        storage::store_analysis(conn, id, &stored, &record)?;
        log_activity(
            conn,
            &company_id,
            ActivityType::Note,
            format!("Analyzed call transcript (sales score {})", stored.data.sales_score),
        );
        Ok(())
    })
    .await?;

    Ok(Json(envelope))
}
