use std::env;

use crate::quickbooks::QuickBooksEnvironment;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub quickbooks: QuickBooksConfig,
    pub openai: OpenAIConfig,
    pub snapshot_cache_hours: i64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct QuickBooksConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub environment: QuickBooksEnvironment,
    pub token_url: String,
    /// Overrides the environment's API host (used by tests and proxies).
    pub api_base: Option<String>,
}

impl QuickBooksConfig {
    pub const DEFAULT_TOKEN_URL: &'static str =
        "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";

    pub fn api_base_url(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| self.environment.api_base_url().to_string())
    }

    pub fn is_valid(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("SERVER_HOST", "0.0.0.0");
        let port_raw = env_or("SERVER_PORT", "8080");
        let port: u16 = port_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "SERVER_PORT",
            value: port_raw.clone(),
        })?;
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let environment_raw = env_or("QBO_ENVIRONMENT", "sandbox");
        let environment = environment_raw
            .parse::<QuickBooksEnvironment>()
            .map_err(|_| ConfigError::Invalid {
                key: "QBO_ENVIRONMENT",
                value: environment_raw.clone(),
            })?;

        let quickbooks = QuickBooksConfig {
            client_id: env_or("QBO_CLIENT_ID", ""),
            client_secret: env_or("QBO_CLIENT_SECRET", ""),
            redirect_uri: env::var("QBO_REDIRECT_URI")
                .unwrap_or_else(|_| format!("{base_url}/api/quickbooks/callback")),
            environment,
            token_url: env_or("QBO_TOKEN_URL", QuickBooksConfig::DEFAULT_TOKEN_URL),
            api_base: env::var("QBO_API_BASE").ok().filter(|s| !s.is_empty()),
        };

        let openai = OpenAIConfig {
            api_key: env_or("OPENAI_API_KEY", ""),
            base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: env_or("OPENAI_MODEL", "gpt-4o"),
        };

        let cache_raw = env_or("SNAPSHOT_CACHE_HOURS", "24");
        let snapshot_cache_hours = cache_raw
            .parse::<i64>()
            .ok()
            .filter(|h| *h > 0)
            .ok_or(ConfigError::Invalid {
                key: "SNAPSHOT_CACHE_HOURS",
                value: cache_raw,
            })?;

        let cors_origins = env_or("CORS_ALLOWED_ORIGINS", "")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if !quickbooks.is_valid() {
            log::warn!("QBO_CLIENT_ID/QBO_CLIENT_SECRET not set; QuickBooks connect flow is disabled");
        }
        if openai.api_key.is_empty() {
            log::warn!("OPENAI_API_KEY not set; AI insights will return fallback content");
        }

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                base_url,
                cors_origins,
            },
            database_url,
            quickbooks,
            openai,
            snapshot_cache_hours,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
