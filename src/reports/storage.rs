use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deck::AuditDeck;
use crate::core::shared::schema::generated_reports;
use crate::insights::storage::{insert_analyses, DbAiAnalysis};

pub const AUDIT_DECK_REPORT: &str = "audit_deck";

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = generated_reports)]
pub struct DbGeneratedReport {
    pub id: Uuid,
    pub company_id: String,
    pub report_type: String,
    pub title: String,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: Uuid,
    pub company_id: String,
    pub report_type: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub deck: Option<AuditDeck>,
}

/// Listing view without the deck body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: Uuid,
    pub company_id: String,
    pub report_type: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub ai_fallback: bool,
}

fn db_report_to_stored(row: DbGeneratedReport) -> StoredReport {
    let deck = serde_json::from_value::<AuditDeck>(row.content).ok();
    StoredReport {
        id: row.id,
        company_id: row.company_id,
        report_type: row.report_type,
        title: row.title,
        created_at: row.created_at,
        deck,
    }
}

pub fn insert_audit_deck(conn: &mut PgConnection, deck: &AuditDeck) -> QueryResult<StoredReport> {
    let row = DbGeneratedReport {
        id: Uuid::new_v4(),
        company_id: deck.company_id.clone(),
        report_type: AUDIT_DECK_REPORT.to_string(),
        title: deck.title.clone(),
        content: serde_json::to_value(deck).unwrap_or_default(),
        created_at: deck.generated_at,
    };
    diesel::insert_into(generated_reports::table)
        .values(&row)
        .execute(conn)?;
    Ok(StoredReport {
        id: row.id,
        company_id: row.company_id,
        report_type: row.report_type,
        title: row.title,
        created_at: row.created_at,
        deck: Some(deck.clone()),
    })
}

/// Stores the deck together with the analyses it was built from, or neither.
pub fn store_audit_deck(
    conn: &mut PgConnection,
    deck: &AuditDeck,
    analyses: &[DbAiAnalysis],
) -> QueryResult<StoredReport> {
    conn.transaction(|conn| {
        let report = insert_audit_deck(conn, deck)?;
        insert_analyses(conn, analyses)?;
        Ok(report)
    })
}

pub fn get_report(conn: &mut PgConnection, id: Uuid) -> QueryResult<StoredReport> {
    generated_reports::table
        .find(id)
        .first::<DbGeneratedReport>(conn)
        .map(db_report_to_stored)
}

pub fn list_reports(
    conn: &mut PgConnection,
    company_id: Option<&str>,
    limit: i64,
) -> QueryResult<Vec<ReportSummary>> {
    let mut query = generated_reports::table.into_boxed();
    if let Some(company_id) = company_id {
        query = query.filter(generated_reports::company_id.eq(company_id.to_string()));
    }
    let rows: Vec<DbGeneratedReport> = query
        .order(generated_reports::created_at.desc())
        .limit(limit)
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let ai_fallback = row
                .content
                .pointer("/ai_content/source")
                .and_then(|v| v.as_str())
                == Some("fallback");
            ReportSummary {
                id: row.id,
                company_id: row.company_id,
                report_type: row.report_type,
                title: row.title,
                created_at: row.created_at,
                ai_fallback,
            }
        })
        .collect())
}
