use tracing_subscriber::EnvFilter;

use zero_api::config;
use zero_api::database::{DatabaseManager, PgStore};
use zero_api::services::seed::{self, SeedSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Zero API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; token issuance and validation will fail");
    }

    if DatabaseManager::is_configured() && config.database.run_migrations {
        prepare_database().await;
    } else if !DatabaseManager::is_configured() {
        tracing::warn!("DATABASE_URL is not set; database routes will answer 503");
    }

    let app = zero_api::app::router();

    // Allow tests or deployments to override port via env
    let port = std::env::var("ZERO_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Zero API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close().await;
    Ok(())
}

/// Migrations then seeding; failures are logged and the server still starts
async fn prepare_database() {
    if let Err(e) = DatabaseManager::run_migrations().await {
        tracing::error!("Database migrations failed: {}", e);
        return;
    }

    match DatabaseManager::main_pool().await {
        Ok(pool) => {
            if let Err(e) = seed::run(&PgStore::new(pool), &SeedSettings::from_config()).await {
                tracing::error!("Seeding failed: {}", e);
            }
        }
        Err(e) => tracing::error!("Database unavailable for seeding: {}", e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
