//! Dealerbook API Server
//!
//! Main entry point for the departmental statement service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealerbook_api::{PostgresState, create_router};
use dealerbook_db::connect_with;
use dealerbook_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealerbook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let state = PostgresState::from_database(db, &config.report);
    info!(
        ledger_timeout_secs = config.report.ledger_timeout_secs,
        max_concurrency = config.report.max_concurrency,
        max_retries = config.report.max_retries,
        timezone = %config.report.timezone,
        "Statement engine configured"
    );
    let shutdown = state.shutdown.clone();

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received, cancelling statements in flight");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
