use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::{FinancialSnapshot, FinancialsError};
use crate::core::shared::error::StorageError;
use crate::quickbooks::{
    parse_balance_sheet, parse_profit_and_loss, service::ReportPeriod, BalanceSheetSummary,
    ProfitAndLossSummary, QuickBooksError, QuickBooksService,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratios {
    pub profit_margin: f64,
    pub debt_to_equity: f64,
}

/// Margin is a percentage; both ratios are 0 when their denominator is not positive.
pub fn compute_ratios(revenue: f64, net_income: f64, liabilities: f64, equity: f64) -> Ratios {
    let profit_margin = if revenue > 0.0 {
        net_income / revenue * 100.0
    } else {
        0.0
    };
    let debt_to_equity = if equity > 0.0 {
        liabilities / equity
    } else {
        0.0
    };
    Ratios {
        profit_margin,
        debt_to_equity,
    }
}

/// A snapshot exactly `ttl` old is stale.
pub fn is_fresh(created_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - created_at < ttl
}

pub fn build_snapshot(
    company_id: &str,
    pnl: ProfitAndLossSummary,
    balance: BalanceSheetSummary,
    raw_reports: Value,
    now: DateTime<Utc>,
) -> FinancialSnapshot {
    let total_equity = balance
        .total_equity
        .unwrap_or(balance.total_assets - balance.total_liabilities);
    let ratios = compute_ratios(
        pnl.revenue,
        pnl.net_income,
        balance.total_liabilities,
        total_equity,
    );

    FinancialSnapshot {
        id: Uuid::new_v4(),
        company_id: company_id.to_string(),
        revenue: pnl.revenue,
        expenses: pnl.expenses,
        net_income: pnl.net_income,
        total_assets: balance.total_assets,
        total_liabilities: balance.total_liabilities,
        total_equity,
        profit_margin: ratios.profit_margin,
        debt_to_equity: ratios.debt_to_equity,
        raw_reports,
        created_at: now,
    }
}

#[derive(Debug, Clone)]
pub struct RawReports {
    pub profit_and_loss: Value,
    pub balance_sheet: Value,
}

#[async_trait]
pub trait FinancialSource: Send + Sync {
    async fn fetch_reports(&self, company_id: &str) -> Result<RawReports, QuickBooksError>;
}

#[async_trait]
impl FinancialSource for QuickBooksService {
    async fn fetch_reports(&self, company_id: &str) -> Result<RawReports, QuickBooksError> {
        let period = ReportPeriod::default();
        let (profit_and_loss, balance_sheet) = tokio::try_join!(
            self.get_profit_and_loss(company_id, &period),
            self.get_balance_sheet(company_id, &period),
        )?;
        Ok(RawReports {
            profit_and_loss,
            balance_sheet,
        })
    }
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn latest(&self, company_id: &str) -> Result<Option<FinancialSnapshot>, StorageError>;
    async fn insert(&self, snapshot: &FinancialSnapshot) -> Result<(), StorageError>;
    async fn history(&self, company_id: &str, limit: i64)
        -> Result<Vec<FinancialSnapshot>, StorageError>;
}

/// Cache-aside over QBO reports with a fixed TTL.
pub struct SnapshotCache {
    store: Arc<dyn SnapshotStore>,
    source: Arc<dyn FinancialSource>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn SnapshotStore>, source: Arc<dyn FinancialSource>, ttl: Duration) -> Self {
        Self { store, source, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_or_refresh(
        &self,
        company_id: &str,
        now: DateTime<Utc>,
        force_refresh: bool,
    ) -> Result<FinancialSnapshot, FinancialsError> {
        if !force_refresh {
            if let Some(cached) = self.store.latest(company_id).await? {
                if is_fresh(cached.created_at, now, self.ttl) {
                    log::debug!("Serving cached snapshot {} for company {company_id}", cached.id);
                    return Ok(cached);
                }
            }
        }

        log::info!("Pulling QuickBooks reports for company {company_id}");
        let reports = self.source.fetch_reports(company_id).await?;
        let pnl = parse_profit_and_loss(&reports.profit_and_loss);
        let balance = parse_balance_sheet(&reports.balance_sheet);
        let raw = json!({
            "profit_and_loss": reports.profit_and_loss,
            "balance_sheet": reports.balance_sheet,
        });

        let snapshot = build_snapshot(company_id, pnl, balance, raw, now);
        self.store.insert(&snapshot).await?;
        Ok(snapshot)
    }

    /// Latest stored snapshot regardless of age, without touching QuickBooks.
    pub async fn latest(&self, company_id: &str) -> Result<Option<FinancialSnapshot>, FinancialsError> {
        Ok(self.store.latest(company_id).await?)
    }

    pub async fn history(
        &self,
        company_id: &str,
        limit: i64,
    ) -> Result<Vec<FinancialSnapshot>, FinancialsError> {
        Ok(self.store.history(company_id, limit.clamp(1, 365)).await?)
    }
}
