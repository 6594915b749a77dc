use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::cache::SnapshotStore;
use super::FinancialSnapshot;
use crate::core::shared::error::StorageError;
use crate::core::shared::schema::financial_snapshots;
use crate::core::shared::utils::{run_blocking, DbPool};

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = financial_snapshots)]
pub struct DbFinancialSnapshot {
    pub id: Uuid,
    pub company_id: String,
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    pub profit_margin: f64,
    pub debt_to_equity: f64,
    pub raw_reports: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<DbFinancialSnapshot> for FinancialSnapshot {
    fn from(row: DbFinancialSnapshot) -> Self {
        Self {
            id: row.id,
            company_id: row.company_id,
            revenue: row.revenue,
            expenses: row.expenses,
            net_income: row.net_income,
            total_assets: row.total_assets,
            total_liabilities: row.total_liabilities,
            total_equity: row.total_equity,
            profit_margin: row.profit_margin,
            debt_to_equity: row.debt_to_equity,
            raw_reports: row.raw_reports,
            created_at: row.created_at,
        }
    }
}

impl From<&FinancialSnapshot> for DbFinancialSnapshot {
    fn from(s: &FinancialSnapshot) -> Self {
        Self {
            id: s.id,
            company_id: s.company_id.clone(),
            revenue: s.revenue,
            expenses: s.expenses,
            net_income: s.net_income,
            total_assets: s.total_assets,
            total_liabilities: s.total_liabilities,
            total_equity: s.total_equity,
            profit_margin: s.profit_margin,
            debt_to_equity: s.debt_to_equity,
            raw_reports: s.raw_reports.clone(),
            created_at: s.created_at,
        }
    }
}

pub struct PgSnapshotStore {
    pool: DbPool,
}

impl PgSnapshotStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn latest(&self, company_id: &str) -> Result<Option<FinancialSnapshot>, StorageError> {
        let company_id = company_id.to_string();
        run_blocking(&self.pool, move |conn| {
            financial_snapshots::table
                .filter(financial_snapshots::company_id.eq(company_id))
                .order(financial_snapshots::created_at.desc())
                .first::<DbFinancialSnapshot>(conn)
                .optional()
        })
        .await
        .map(|row| row.map(FinancialSnapshot::from))
    }

    async fn insert(&self, snapshot: &FinancialSnapshot) -> Result<(), StorageError> {
        let row = DbFinancialSnapshot::from(snapshot);
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(financial_snapshots::table)
                .values(&row)
                .execute(conn)
        })
        .await
        .map(|_| ())
    }

    async fn history(
        &self,
        company_id: &str,
        limit: i64,
    ) -> Result<Vec<FinancialSnapshot>, StorageError> {
        let company_id = company_id.to_string();
        run_blocking(&self.pool, move |conn| {
            financial_snapshots::table
                .filter(financial_snapshots::company_id.eq(company_id))
                .order(financial_snapshots::created_at.desc())
                .limit(limit)
                .load::<DbFinancialSnapshot>(conn)
        })
        .await
        .map(|rows| rows.into_iter().map(FinancialSnapshot::from).collect())
    }
}
