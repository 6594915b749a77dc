use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use ledgr::core::config::AppConfig;
use ledgr::core::shared::state::AppState;
use ledgr::core::shared::utils::{create_conn, run_migrations};
use ledgr::main_module::run_axum_server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    let pool = create_conn(&config.database_url).map_err(|e| {
        error!("Failed to create database pool: {e}");
        std::io::Error::other(e)
    })?;
    run_migrations(&pool).map_err(|e| {
        error!("Failed to run migrations: {e}");
        std::io::Error::other(e)
    })?;

    info!(
        "Starting ledgr {} (QuickBooks {})",
        env!("CARGO_PKG_VERSION"),
        config.quickbooks.environment
    );
    let state = Arc::new(AppState::new(config, pool));
    run_axum_server(state).await
}
