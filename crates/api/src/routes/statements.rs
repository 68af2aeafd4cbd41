//! Departmental statement routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use dealerbook_core::LedgerQuery;
use dealerbook_core::chart::ChartStore;
use dealerbook_shared::{AppError, TenantId};

use crate::AppState;
use crate::error::{app_error, error_response};

/// Creates the statement routes.
pub fn routes<L, S>() -> Router<AppState<L, S>>
where
    L: LedgerQuery + 'static,
    S: ChartStore + 'static,
{
    Router::new().route(
        "/tenants/{tenant_id}/statements/departmental",
        get(get_departmental_statement::<L, S>),
    )
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters for the departmental statement.
#[derive(Debug, Deserialize)]
pub struct StatementQuery {
    /// First day of the period.
    pub from: Option<NaiveDate>,
    /// Last day of the period.
    pub to: Option<NaiveDate>,
    /// Include per-account lines.
    #[serde(default)]
    pub detail: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tenants/{tenant_id}/statements/departmental?from&to&detail
async fn get_departmental_statement<L, S>(
    State(state): State<AppState<L, S>>,
    Path(tenant_id): Path<Uuid>,
    Query(query): Query<StatementQuery>,
) -> Response
where
    L: LedgerQuery + 'static,
    S: ChartStore + 'static,
{
    let tenant_id = TenantId::from_uuid(tenant_id);
    let (Some(from), Some(to)) = (query.from, query.to) else {
        return error_response(&AppError::Validation(
            "query parameters 'from' and 'to' are required (YYYY-MM-DD)".to_string(),
        ));
    };

    info!(%tenant_id, %from, %to, detail = query.detail, "Departmental statement requested");

    let engine = &state.engine;
    let shutdown = &state.shutdown;
    let result = state
        .retry
        .run(|| engine.generate_statement_cancellable(tenant_id, from, to, query.detail, shutdown))
        .await;

    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => {
            let err = app_error(err);
            if err.status_code() >= 500 {
                error!(%tenant_id, error = %err, "Departmental statement failed");
            } else {
                warn!(%tenant_id, error = %err, "Departmental statement rejected");
            }
            error_response(&err)
        }
    }
}
