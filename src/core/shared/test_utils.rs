use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::benchmarks::IndustryBenchmark;
use crate::core::config::{AppConfig, OpenAIConfig, QuickBooksConfig, ServerConfig};
use crate::core::shared::state::AppState;
use crate::core::shared::error::StorageError;
use crate::financials::{FinancialSnapshot, FinancialSource, RawReports, SnapshotStore};
use crate::insights::{fallback, CompanyProfile, Insight};
use crate::llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError};
use crate::quickbooks::{QuickBooksEnvironment, QuickBooksError, StoredToken, TokenStore};
use crate::reports::{build_audit_deck, AuditDeck};

pub type RecordedCall = (Vec<ChatMessage>, CompletionOptions);

/// Returns a canned completion and records every request it receives.
#[derive(Debug)]
pub struct MockLLMProvider {
    response: String,
    failing: bool,
    failure: std::sync::Mutex<Option<LlmError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLLMProvider {
    pub fn with_response(response: &str) -> Self {
        Self {
            response: response.to_string(),
            failing: false,
            failure: std::sync::Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The first call fails with `err`; later calls fail with `EmptyResponse`.
    pub fn failing(err: LlmError) -> Self {
        Self {
            response: String::new(),
            failing: true,
            failure: std::sync::Mutex::new(Some(err)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .await
            .push((messages.to_vec(), options.clone()));
        if self.failing {
            let err = self.failure.lock().ok().and_then(|mut f| f.take());
            return Err(err.unwrap_or(LlmError::EmptyResponse));
        }
        Ok(self.response.clone())
    }

    fn model(&self) -> &str {
        "mock"
    }
}

pub fn qbo_config(token_url: &str) -> QuickBooksConfig {
    QuickBooksConfig {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: "http://localhost:8080/api/quickbooks/callback".to_string(),
        environment: QuickBooksEnvironment::Sandbox,
        token_url: token_url.to_string(),
        api_base: None,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<String, StoredToken>>,
}

impl InMemoryTokenStore {
    pub fn with(token: StoredToken) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token.company_id.clone(), token);
        Self {
            tokens: Mutex::new(tokens),
        }
    }

    pub async fn get(&self, company_id: &str) -> Option<StoredToken> {
        self.tokens.lock().await.get(company_id).cloned()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self, company_id: &str) -> Result<Option<StoredToken>, StorageError> {
        Ok(self.get(company_id).await)
    }

    async fn save(&self, token: &StoredToken) -> Result<(), StorageError> {
        self.tokens
            .lock()
            .await
            .insert(token.company_id.clone(), token.clone());
        Ok(())
    }

    async fn delete(&self, company_id: &str) -> Result<bool, StorageError> {
        Ok(self.tokens.lock().await.remove(company_id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<Vec<FinancialSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn with(snapshots: Vec<FinancialSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots),
        }
    }

    pub async fn len(&self) -> usize {
        self.snapshots.lock().await.len()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn latest(&self, company_id: &str) -> Result<Option<FinancialSnapshot>, StorageError> {
        Ok(self
            .snapshots
            .lock()
            .await
            .iter()
            .filter(|s| s.company_id == company_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn insert(&self, snapshot: &FinancialSnapshot) -> Result<(), StorageError> {
        self.snapshots.lock().await.push(snapshot.clone());
        Ok(())
    }

    async fn history(
        &self,
        company_id: &str,
        limit: i64,
    ) -> Result<Vec<FinancialSnapshot>, StorageError> {
        let mut rows: Vec<FinancialSnapshot> = self
            .snapshots
            .lock()
            .await
            .iter()
            .filter(|s| s.company_id == company_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

fn summary_row(group: &str, value: f64) -> Value {
    json!({
        "group": group,
        "Summary": { "ColData": [{ "value": group }, { "value": value.to_string() }] }
    })
}

/// Serves fixed QBO reports: $250,000 revenue and $30,000 net income.
#[derive(Debug)]
pub struct StaticSource {
    reports: Option<RawReports>,
    fetches: AtomicUsize,
}

impl Default for StaticSource {
    fn default() -> Self {
        let profit_and_loss = json!({
            "Header": { "ReportName": "ProfitAndLoss" },
            "Rows": { "Row": [
                summary_row("Income", 250_000.0),
                summary_row("Expenses", 220_000.0),
                summary_row("NetIncome", 30_000.0),
            ]}
        });
        let balance_sheet = json!({
            "Header": { "ReportName": "BalanceSheet" },
            "Rows": { "Row": [
                summary_row("TotalAssets", 400_000.0),
                summary_row("Liabilities", 150_000.0),
                summary_row("Equity", 250_000.0),
            ]}
        });
        Self {
            reports: Some(RawReports {
                profit_and_loss,
                balance_sheet,
            }),
            fetches: AtomicUsize::new(0),
        }
    }
}

impl StaticSource {
    pub fn disconnected() -> Self {
        Self {
            reports: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FinancialSource for StaticSource {
    async fn fetch_reports(&self, company_id: &str) -> Result<RawReports, QuickBooksError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.reports
            .clone()
            .ok_or_else(|| QuickBooksError::NotConnected(company_id.to_string()))
    }
}

pub fn sample_snapshot(company_id: &str) -> FinancialSnapshot {
    FinancialSnapshot {
        id: Uuid::new_v4(),
        company_id: company_id.to_string(),
        revenue: 850_000.0,
        expenses: 790_000.0,
        net_income: 60_000.0,
        total_assets: 620_000.0,
        total_liabilities: 410_000.0,
        total_equity: 210_000.0,
        profit_margin: 60_000.0 / 850_000.0 * 100.0,
        debt_to_equity: 410_000.0 / 210_000.0,
        raw_reports: Value::Null,
        created_at: Utc::now(),
    }
}

pub fn sample_generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap()
}

/// A fully inferred deck with a benchmark and transcript pain points.
pub fn sample_deck() -> AuditDeck {
    let generated_at = sample_generated_at();
    let profile = CompanyProfile {
        company_id: Some("realm-1".to_string()),
        industry: Some("construction".to_string()),
        benchmark: Some(IndustryBenchmark {
            industry: "construction".to_string(),
            avg_profit_margin: 6.5,
            avg_debt_to_equity: 1.4,
            avg_revenue_growth: 4.0,
            notes: None,
            updated_at: generated_at,
        }),
        ..CompanyProfile::named("Acme Builders")
    };
    let mut snapshot = sample_snapshot("realm-1");
    snapshot.created_at = generated_at;
    let transcript = fallback::transcript_analysis("Acme Builders");

    build_audit_deck(
        &profile,
        &snapshot,
        Some(&transcript),
        &Insight::Inferred(fallback::audit_deck_intelligence("Acme Builders")),
        generated_at,
    )
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_url: "http://localhost:8080".to_string(),
            cors_origins: Vec::new(),
        },
        database_url: "postgres://ledgr@127.0.0.1:1/ledgr".to_string(),
        quickbooks: qbo_config("http://127.0.0.1:1/tokens"),
        openai: OpenAIConfig {
            api_key: String::new(),
            base_url: "http://127.0.0.1:1".to_string(),
            model: "mock".to_string(),
        },
        snapshot_cache_hours: 24,
    }
}

/// State over a pool that never connects; database-backed routes fail fast.
pub fn test_app_state() -> Arc<AppState> {
    use diesel::r2d2::{ConnectionManager, Pool};

    let config = test_config();
    let pool = Pool::builder()
        .connection_timeout(std::time::Duration::from_millis(200))
        .build_unchecked(ConnectionManager::new(config.database_url.clone()));
    Arc::new(AppState::with_llm_provider(
        config,
        pool,
        reqwest::Client::new(),
        Arc::new(MockLLMProvider::with_response("{}")),
    ))
}
