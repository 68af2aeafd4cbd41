//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for departmental statements
//! - Mapping of statement errors onto HTTP responses
//! - The retry policy applied to transient ledger failures

pub mod error;
pub mod retry;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use dealerbook_core::chart::{ChartStore, MappingRegistry};
use dealerbook_core::{EngineOptions, LedgerQuery, StatementEngine};
use dealerbook_db::{LedgerRepository, TenantChartRepository};
use dealerbook_shared::ReportConfig;

pub use retry::RetryPolicy;

/// Application state shared across handlers.
pub struct AppState<L: LedgerQuery, S: ChartStore> {
    /// Statement engine.
    pub engine: Arc<StatementEngine<L, S>>,
    /// Retry policy for transient ledger failures.
    pub retry: RetryPolicy,
    /// Cancelled on shutdown; aborts statements still being computed.
    pub shutdown: CancellationToken,
}

impl<L: LedgerQuery, S: ChartStore> Clone for AppState<L, S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            retry: self.retry,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<L: LedgerQuery, S: ChartStore> AppState<L, S> {
    /// Creates state around an engine.
    #[must_use]
    pub fn new(engine: StatementEngine<L, S>, retry: RetryPolicy) -> Self {
        Self {
            engine: Arc::new(engine),
            retry,
            shutdown: CancellationToken::new(),
        }
    }
}

/// State wired to the Postgres repositories.
pub type PostgresState = AppState<LedgerRepository, TenantChartRepository>;

impl PostgresState {
    /// Builds the engine over a database pool.
    #[must_use]
    pub fn from_database(db: DatabaseConnection, config: &ReportConfig) -> Self {
        let registry = MappingRegistry::with_config(
            Arc::new(TenantChartRepository::new(db.clone())),
            config.chart_cache_capacity,
            config.chart_cache_ttl_secs,
        );
        let engine = StatementEngine::new(
            Arc::new(LedgerRepository::new(db)),
            registry,
            EngineOptions::from(config),
        );
        Self::new(engine, RetryPolicy::from(config))
    }
}

/// Creates the main application router.
pub fn create_router<L, S>(state: AppState<L, S>) -> Router
where
    L: LedgerQuery + 'static,
    S: ChartStore + 'static,
{
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
