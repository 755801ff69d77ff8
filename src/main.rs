//! Opsdesk bootstrap binary.
//!
//! Prepares a deployment environment for the dashboard: loads the merged
//! configuration, connects to PostgreSQL, applies pending migrations, and
//! verifies connectivity before exiting.

use tracing_subscriber::{EnvFilter, fmt};

use opsdesk_core::config::AppConfig;
use opsdesk_core::error::AppError;
use opsdesk_database::connection::DatabasePool;
use opsdesk_database::migration::run_migrations;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Bootstrap error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by `OPSDESK_ENV`
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("OPSDESK_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Connect to the database, run migrations, and verify the connection
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Opsdesk bootstrap v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;

    run_migrations(db.pool()).await?;

    if !db.health_check().await? {
        return Err(AppError::internal("Database health check failed"));
    }

    db.close().await;
    tracing::info!("Database ready");
    Ok(())
}
