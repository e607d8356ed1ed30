use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use oab_comissoes_api::app::{app, AppState};
use oab_comissoes_api::config::config;
use oab_comissoes_api::database::DatabaseManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config();
    let default_level = if config.is_development() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    tracing::info!("Starting OAB Comissões API in {:?} mode", config.environment);

    if config.security.jwt_secret.trim().is_empty() {
        bail!("JWT_SECRET must be set");
    }

    let pool = DatabaseManager::connect_lazy(&config.database).context("invalid database configuration")?;
    if config.database.auto_migrate {
        if let Err(e) = DatabaseManager::apply_schema(&pool).await {
            tracing::warn!("Schema not applied at startup: {}", e);
        }
    }

    let state = AppState::new(pool, config.clone()).context("failed to build application state")?;
    if !state.ideia.is_configured() {
        tracing::warn!("OPENAI_API_KEY not set; POST /api/ideia will answer 503");
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("OAB Comissões API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
