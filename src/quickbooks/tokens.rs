use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::oauth::QuickBooksOAuth;
use super::QuickBooksError;
use crate::core::shared::error::StorageError;
use crate::core::shared::schema::qbo_tokens;
use crate::core::shared::utils::{run_blocking, DbPool};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredToken {
    pub company_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// `now >= expires_at` counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self, company_id: &str) -> Result<Option<StoredToken>, StorageError>;
    async fn save(&self, token: &StoredToken) -> Result<(), StorageError>;
    async fn delete(&self, company_id: &str) -> Result<bool, StorageError>;
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = qbo_tokens)]
pub struct DbQboToken {
    pub company_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbQboToken> for StoredToken {
    fn from(row: DbQboToken) -> Self {
        Self {
            company_id: row.company_id,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
            refresh_token_expires_at: row.refresh_token_expires_at,
        }
    }
}

pub struct PgTokenStore {
    pool: DbPool,
}

impl PgTokenStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn load(&self, company_id: &str) -> Result<Option<StoredToken>, StorageError> {
        let company_id = company_id.to_string();
        run_blocking(&self.pool, move |conn| {
            qbo_tokens::table
                .find(company_id)
                .first::<DbQboToken>(conn)
                .optional()
        })
        .await
        .map(|row| row.map(StoredToken::from))
    }

    async fn save(&self, token: &StoredToken) -> Result<(), StorageError> {
        let row = DbQboToken {
            company_id: token.company_id.clone(),
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at: token.expires_at,
            refresh_token_expires_at: token.refresh_token_expires_at,
            updated_at: Utc::now(),
        };
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(qbo_tokens::table)
                .values(&row)
                .on_conflict(qbo_tokens::company_id)
                .do_update()
                .set(&row)
                .execute(conn)
        })
        .await
        .map(|_| ())
    }

    async fn delete(&self, company_id: &str) -> Result<bool, StorageError> {
        let company_id = company_id.to_string();
        run_blocking(&self.pool, move |conn| {
            diesel::delete(qbo_tokens::table.find(company_id)).execute(conn)
        })
        .await
        .map(|n| n > 0)
    }
}

/// Hands out usable access tokens, refreshing expired ones in place.
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    oauth: QuickBooksOAuth,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, oauth: QuickBooksOAuth) -> Self {
        Self {
            store,
            oauth,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn oauth(&self) -> &QuickBooksOAuth {
        &self.oauth
    }

    async fn company_lock(&self, company_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(company_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn is_connected(&self, company_id: &str) -> Result<bool, QuickBooksError> {
        Ok(self.store.load(company_id).await?.is_some())
    }

    pub async fn get_valid_access_token(&self, company_id: &str) -> Result<String, QuickBooksError> {
        self.get_valid_access_token_at(company_id, Utc::now()).await
    }

    /// Drops the company's lock entry once no caller holds or waits on it.
    async fn release_lock(&self, company_id: &str) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(company_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(company_id);
        }
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Callers for one company are serialized, so a second caller waiting on
    /// the lock sees the token the first one refreshed.
    pub async fn get_valid_access_token_at(
        &self,
        company_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, QuickBooksError> {
        let lock = self.company_lock(company_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.current_or_refreshed(company_id, now).await
        };
        drop(lock);
        self.release_lock(company_id).await;
        result
    }

    async fn current_or_refreshed(
        &self,
        company_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, QuickBooksError> {
        let token = self
            .store
            .load(company_id)
            .await?
            .ok_or_else(|| QuickBooksError::NotConnected(company_id.to_string()))?;

        if !token.is_expired(now) {
            return Ok(token.access_token);
        }

        if token
            .refresh_token_expires_at
            .is_some_and(|expires| now >= expires)
        {
            log::warn!("Refresh token for company {company_id} has expired; reconnect required");
            return Err(QuickBooksError::Refresh(
                "refresh token expired, reconnect QuickBooks".to_string(),
            ));
        }

        log::info!("Access token for company {company_id} expired, refreshing");
        let refreshed = self
            .oauth
            .refresh(&token.refresh_token)
            .await
            .inspect_err(|e| log::error!("Token refresh for company {company_id} failed: {e}"))?;

        let mut stored = refreshed.into_stored(company_id, now);
        if stored.refresh_token_expires_at.is_none() {
            stored.refresh_token_expires_at = token.refresh_token_expires_at;
        }
        self.store.save(&stored).await?;

        Ok(stored.access_token)
    }

    pub async fn store_token(&self, token: &StoredToken) -> Result<(), QuickBooksError> {
        self.store.save(token).await?;
        Ok(())
    }

    pub async fn disconnect(&self, company_id: &str) -> Result<bool, QuickBooksError> {
        let removed = self.store.delete(company_id).await?;
        self.locks.lock().await.remove(company_id);
        if removed {
            log::info!("Disconnected QuickBooks for company {company_id}");
        }
        Ok(removed)
    }
}
