use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AnalysisKind, Insight};
use crate::core::shared::schema::ai_analyses;

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = ai_analyses)]
pub struct DbAiAnalysis {
    pub id: Uuid,
    pub company_id: String,
    pub analysis_type: String,
    pub source: String,
    pub fallback_reason: Option<String>,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Builds the row for one engine result without touching the database.
pub fn analysis_record<T: Serialize>(
    company_id: &str,
    kind: AnalysisKind,
    insight: &Insight<T>,
) -> DbAiAnalysis {
    DbAiAnalysis {
        id: Uuid::new_v4(),
        company_id: company_id.to_string(),
        analysis_type: kind.as_str().to_string(),
        source: insight.source().as_str().to_string(),
        fallback_reason: insight.fallback_reason().map(ToString::to_string),
        result: serde_json::to_value(insight.value()).unwrap_or_default(),
        created_at: Utc::now(),
    }
}

pub fn insert_analyses(conn: &mut PgConnection, rows: &[DbAiAnalysis]) -> QueryResult<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    diesel::insert_into(ai_analyses::table)
        .values(rows)
        .execute(conn)
}

pub fn list_analyses(
    conn: &mut PgConnection,
    company_id: &str,
    analysis_type: Option<&str>,
    limit: i64,
) -> QueryResult<Vec<DbAiAnalysis>> {
    let mut query = ai_analyses::table
        .filter(ai_analyses::company_id.eq(company_id.to_string()))
        .into_boxed();
    if let Some(kind) = analysis_type {
        query = query.filter(ai_analyses::analysis_type.eq(kind.to_string()));
    }
    query
        .order(ai_analyses::created_at.desc())
        .limit(limit)
        .load(conn)
}
