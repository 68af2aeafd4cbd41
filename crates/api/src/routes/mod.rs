//! API route definitions.

use axum::Router;

use dealerbook_core::LedgerQuery;
use dealerbook_core::chart::ChartStore;

use crate::AppState;

pub mod health;
pub mod statements;

/// Creates the API router with all routes.
pub fn api_routes<L, S>() -> Router<AppState<L, S>>
where
    L: LedgerQuery + 'static,
    S: ChartStore + 'static,
{
    Router::new()
        .merge(health::routes())
        .merge(statements::routes())
}
