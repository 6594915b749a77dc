use std::sync::Arc;

use chrono::Duration;

use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;
use crate::financials::{PgSnapshotStore, SnapshotCache};
use crate::insights::InsightsEngine;
use crate::llm::{LLMProvider, OpenAIClient};
use crate::quickbooks::{PgTokenStore, QuickBooksOAuth, QuickBooksService, TokenManager};

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub http: reqwest::Client,
    pub llm_provider: Arc<dyn LLMProvider>,
    pub insights: Arc<InsightsEngine>,
    pub quickbooks: Arc<QuickBooksService>,
    pub snapshots: Arc<SnapshotCache>,
}

impl AppState {
    /// Wires the production services around one pool and one HTTP client.
    pub fn new(config: AppConfig, conn: DbPool) -> Self {
        let http = reqwest::Client::new();

        let llm_provider: Arc<dyn LLMProvider> = Arc::new(
            OpenAIClient::new(
                config.openai.api_key.clone(),
                Some(config.openai.base_url.clone()),
            )
            .with_model(config.openai.model.clone()),
        );
        Self::with_llm_provider(config, conn, http, llm_provider)
    }

    pub fn with_llm_provider(
        config: AppConfig,
        conn: DbPool,
        http: reqwest::Client,
        llm_provider: Arc<dyn LLMProvider>,
    ) -> Self {
        let tokens = Arc::new(TokenManager::new(
            Arc::new(PgTokenStore::new(conn.clone())),
            QuickBooksOAuth::new(config.quickbooks.clone(), http.clone()),
        ));
        let quickbooks = Arc::new(QuickBooksService::new(
            http.clone(),
            tokens,
            config.quickbooks.api_base_url(),
        ));
        let snapshots = Arc::new(SnapshotCache::new(
            Arc::new(PgSnapshotStore::new(conn.clone())),
            quickbooks.clone(),
            Duration::hours(config.snapshot_cache_hours),
        ));
        let insights = Arc::new(InsightsEngine::new(llm_provider.clone()));

        Self {
            conn,
            config,
            http,
            llm_provider,
            insights,
            quickbooks,
            snapshots,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conn", &"DbPool")
            .field("config", &self.config.server)
            .field("llm_model", &self.llm_provider.model())
            .field("snapshot_ttl", &self.snapshots.ttl())
            .finish()
    }
}
