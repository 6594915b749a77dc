use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use std::collections::HashSet;

use crate::core::shared::schema::{
    call_transcripts, financial_snapshots, generated_reports, prospects, qbo_tokens,
};

use super::types::{
    derive_workflow_stage, CreateProspectRequest, ListProspectsQuery, Prospect, StageSignals,
    UpdateProspectRequest,
};

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = prospects)]
pub struct DbProspect {
    pub company_id: String,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = prospects)]
struct ProspectChanges {
    company_name: Option<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    industry: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

pub fn db_prospect_to_prospect(row: DbProspect, signals: StageSignals) -> Prospect {
    Prospect {
        company_id: row.company_id,
        company_name: row.company_name,
        contact_name: row.contact_name,
        contact_email: row.contact_email,
        contact_phone: row.contact_phone,
        industry: row.industry,
        workflow_stage: derive_workflow_stage(signals),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Company ids that have at least one row of each stage-relevant kind.
struct StageIndex {
    tokens: HashSet<String>,
    snapshots: HashSet<String>,
    analyzed_calls: HashSet<String>,
    reports: HashSet<String>,
}

impl StageIndex {
    fn load(conn: &mut PgConnection, ids: &[String]) -> QueryResult<Self> {
        let tokens = qbo_tokens::table
            .filter(qbo_tokens::company_id.eq_any(ids))
            .select(qbo_tokens::company_id)
            .load::<String>(conn)?;
        let snapshots = financial_snapshots::table
            .filter(financial_snapshots::company_id.eq_any(ids))
            .select(financial_snapshots::company_id)
            .distinct()
            .load::<String>(conn)?;
        let analyzed_calls = call_transcripts::table
            .filter(call_transcripts::company_id.eq_any(ids))
            .filter(call_transcripts::analyzed_at.is_not_null())
            .select(call_transcripts::company_id)
            .distinct()
            .load::<String>(conn)?;
        let reports = generated_reports::table
            .filter(generated_reports::company_id.eq_any(ids))
            .select(generated_reports::company_id)
            .distinct()
            .load::<String>(conn)?;

        Ok(Self {
            tokens: tokens.into_iter().collect(),
            snapshots: snapshots.into_iter().collect(),
            analyzed_calls: analyzed_calls.into_iter().collect(),
            reports: reports.into_iter().collect(),
        })
    }

    fn signals(&self, company_id: &str) -> StageSignals {
        StageSignals {
            has_token: self.tokens.contains(company_id),
            has_snapshot: self.snapshots.contains(company_id),
            has_analyzed_call: self.analyzed_calls.contains(company_id),
            has_report: self.reports.contains(company_id),
        }
    }
}

pub fn list_prospects(
    conn: &mut PgConnection,
    query: &ListProspectsQuery,
) -> QueryResult<Vec<Prospect>> {
    let mut db_query = prospects::table.into_boxed();

    if let Some(ref search) = query.search {
        let term = format!("%{search}%");
        db_query = db_query.filter(
            prospects::company_name
                .ilike(term.clone())
                .or(prospects::contact_name.ilike(term)),
        );
    }

    let rows: Vec<DbProspect> = db_query
        .order(prospects::updated_at.desc())
        .load(conn)?;

    let ids: Vec<String> = rows.iter().map(|r| r.company_id.clone()).collect();
    let index = StageIndex::load(conn, &ids)?;

    let limit = query.limit.unwrap_or(100).max(0) as usize;
    let offset = query.offset.unwrap_or(0).max(0) as usize;

    // Stage is derived, so the stage filter and paging run after derivation.
    Ok(rows
        .into_iter()
        .map(|row| {
            let signals = index.signals(&row.company_id);
            db_prospect_to_prospect(row, signals)
        })
        .filter(|p| query.stage.map_or(true, |stage| p.workflow_stage == stage))
        .skip(offset)
        .take(limit)
        .collect())
}

pub fn get_prospect(conn: &mut PgConnection, company_id: &str) -> QueryResult<Prospect> {
    let row: DbProspect = prospects::table.find(company_id).first(conn)?;
    let index = StageIndex::load(conn, &[row.company_id.clone()])?;
    let signals = index.signals(&row.company_id);
    Ok(db_prospect_to_prospect(row, signals))
}

pub fn find_prospect(conn: &mut PgConnection, company_id: &str) -> QueryResult<Option<DbProspect>> {
    prospects::table.find(company_id).first(conn).optional()
}

pub fn insert_prospect(conn: &mut PgConnection, req: CreateProspectRequest) -> QueryResult<Prospect> {
    let now = Utc::now();
    let row = DbProspect {
        company_id: req.company_id,
        company_name: req.company_name,
        contact_name: req.contact_name,
        contact_email: req.contact_email,
        contact_phone: req.contact_phone,
        industry: req.industry,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(prospects::table)
        .values(&row)
        .execute(conn)?;
    Ok(db_prospect_to_prospect(row, StageSignals::default()))
}

pub fn update_prospect(
    conn: &mut PgConnection,
    company_id: &str,
    req: UpdateProspectRequest,
) -> QueryResult<Prospect> {
    let changes = ProspectChanges {
        company_name: req.company_name,
        contact_name: req.contact_name,
        contact_email: req.contact_email,
        contact_phone: req.contact_phone,
        industry: req.industry,
        updated_at: Some(Utc::now()),
    };
    let updated = diesel::update(prospects::table.find(company_id))
        .set(&changes)
        .execute(conn)?;
    if updated == 0 {
        return Err(diesel::result::Error::NotFound);
    }
    get_prospect(conn, company_id)
}

/// Related rows go with it through `ON DELETE CASCADE`.
pub fn delete_prospect(conn: &mut PgConnection, company_id: &str) -> QueryResult<bool> {
    diesel::delete(prospects::table.find(company_id))
        .execute(conn)
        .map(|n| n > 0)
}

/// Inserts a placeholder row keyed by the realm id if none exists yet.
pub fn ensure_prospect(conn: &mut PgConnection, company_id: &str) -> QueryResult<()> {
    let now = Utc::now();
    let row = DbProspect {
        company_id: company_id.to_string(),
        company_name: company_id.to_string(),
        contact_name: None,
        contact_email: None,
        contact_phone: None,
        industry: None,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(prospects::table)
        .values(&row)
        .on_conflict_do_nothing()
        .execute(conn)
        .map(|_| ())
}

/// Creates the prospect on first QuickBooks connect, or refreshes its name.
pub fn upsert_connected_prospect(
    conn: &mut PgConnection,
    company_id: &str,
    company_name: &str,
    contact_email: Option<String>,
    contact_phone: Option<String>,
) -> QueryResult<()> {
    let now = Utc::now();
    let row = DbProspect {
        company_id: company_id.to_string(),
        company_name: company_name.to_string(),
        contact_name: None,
        contact_email,
        contact_phone,
        industry: None,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(prospects::table)
        .values(&row)
        .on_conflict(prospects::company_id)
        .do_update()
        .set((
            prospects::company_name.eq(company_name),
            prospects::updated_at.eq(now),
        ))
        .execute(conn)
        .map(|_| ())
}
