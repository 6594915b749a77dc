use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::schema::call_transcripts;
use crate::insights::storage::{insert_analyses, DbAiAnalysis};
use crate::insights::{InsightEnvelope, TranscriptAnalysis};

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = call_transcripts)]
pub struct DbCallTranscript {
    pub id: Uuid,
    pub company_id: String,
    pub file_name: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub participants: Vec<String>,
    pub call_date: Option<DateTime<Utc>>,
    pub content: String,
    pub analysis: Option<serde_json::Value>,
    pub sales_score: Option<i32>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DbCallTranscript {
    /// The stored analysis, if one exists and still matches the current shape.
    pub fn analysis_envelope(&self) -> Option<InsightEnvelope<TranscriptAnalysis>> {
        let raw = self.analysis.clone()?;
        serde_json::from_value(raw).ok()
    }
}

pub fn insert_transcript(conn: &mut PgConnection, row: &DbCallTranscript) -> QueryResult<()> {
    diesel::insert_into(call_transcripts::table)
        .values(row)
        .execute(conn)
        .map(|_| ())
}

pub fn get_transcript(conn: &mut PgConnection, id: Uuid) -> QueryResult<DbCallTranscript> {
    call_transcripts::table.find(id).first(conn)
}

pub fn list_transcripts(
    conn: &mut PgConnection,
    company_id: Option<&str>,
    limit: i64,
) -> QueryResult<Vec<DbCallTranscript>> {
    let mut query = call_transcripts::table.into_boxed();
    if let Some(company_id) = company_id {
        query = query.filter(call_transcripts::company_id.eq(company_id.to_string()));
    }
    query
        .order(call_transcripts::created_at.desc())
        .limit(limit)
        .load(conn)
}

pub fn delete_transcript(conn: &mut PgConnection, id: Uuid) -> QueryResult<bool> {
    diesel::delete(call_transcripts::table.find(id))
        .execute(conn)
        .map(|n| n > 0)
}

pub fn save_analysis(
    conn: &mut PgConnection,
    id: Uuid,
    envelope: &InsightEnvelope<TranscriptAnalysis>,
) -> QueryResult<()> {
    let analysis = serde_json::to_value(envelope).unwrap_or_default();
    diesel::update(call_transcripts::table.find(id))
        .set((
            call_transcripts::analysis.eq(Some(analysis)),
            call_transcripts::sales_score.eq(Some(i32::from(envelope.data.sales_score))),
            call_transcripts::analyzed_at.eq(Some(Utc::now())),
        ))
        .execute(conn)
        .map(|_| ())
}

/// Saves the analysis on the transcript and its `ai_analyses` row in one transaction.
pub fn store_analysis(
    conn: &mut PgConnection,
    id: Uuid,
    envelope: &InsightEnvelope<TranscriptAnalysis>,
    record: &DbAiAnalysis,
) -> QueryResult<()> {
    conn.transaction(|conn| {
        save_analysis(conn, id, envelope)?;
        insert_analyses(conn, std::slice::from_ref(record))?;
        Ok(())
    })
}

/// Most recently analyzed transcript for a company.
pub fn latest_analyzed(
    conn: &mut PgConnection,
    company_id: &str,
) -> QueryResult<Option<DbCallTranscript>> {
    call_transcripts::table
        .filter(call_transcripts::company_id.eq(company_id.to_string()))
        .filter(call_transcripts::analyzed_at.is_not_null())
        .order(call_transcripts::analyzed_at.desc())
        .first(conn)
        .optional()
}
