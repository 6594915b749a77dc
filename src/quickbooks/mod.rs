//! QuickBooks Online integration
//!
//! OAuth2 connect flow, token persistence with refresh-on-expiry, and thin
//! wrappers around the QBO reporting API.

pub mod oauth;
pub mod reports;
pub mod routes;
pub mod service;
pub mod tokens;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::shared::error::{ApiError, StorageError};

pub use oauth::{ConnectState, QuickBooksOAuth, TokenResponse};
pub use reports::{parse_balance_sheet, parse_profit_and_loss, BalanceSheetSummary, ProfitAndLossSummary};
pub use routes::configure_quickbooks_routes;
pub use service::{CompanyInfo, QuickBooksService};
pub use tokens::{PgTokenStore, StoredToken, TokenManager, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickBooksEnvironment {
    Sandbox,
    Production,
}

impl QuickBooksEnvironment {
    pub fn api_base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox-quickbooks.api.intuit.com",
            Self::Production => "https://quickbooks.api.intuit.com",
        }
    }
}

impl FromStr for QuickBooksEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" | "development" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown QuickBooks environment: {other}")),
        }
    }
}

impl fmt::Display for QuickBooksEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuickBooksError {
    #[error("QuickBooks client credentials are not configured")]
    NotConfigured,
    #[error("Company {0} is not connected to QuickBooks")]
    NotConnected(String),
    #[error("Token exchange failed: {0}")]
    Exchange(String),
    #[error("Token refresh failed: {0}")]
    Refresh(String),
    #[error("QuickBooks API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<QuickBooksError> for ApiError {
    fn from(err: QuickBooksError) -> Self {
        match err {
            QuickBooksError::NotConfigured => ApiError::Internal(err.to_string()),
            QuickBooksError::NotConnected(_) | QuickBooksError::Refresh(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            QuickBooksError::Exchange(_)
            | QuickBooksError::Api { .. }
            | QuickBooksError::Transport(_) => ApiError::Upstream(err.to_string()),
            QuickBooksError::Storage(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "Sandbox".parse::<QuickBooksEnvironment>(),
            Ok(QuickBooksEnvironment::Sandbox)
        );
        assert_eq!(
            "production".parse::<QuickBooksEnvironment>(),
            Ok(QuickBooksEnvironment::Production)
        );
        assert!("staging".parse::<QuickBooksEnvironment>().is_err());
    }

    #[test]
    fn test_refresh_failure_is_unauthorized() {
        let err: ApiError = QuickBooksError::Refresh("invalid_grant".into()).into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: ApiError = QuickBooksError::Api {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
