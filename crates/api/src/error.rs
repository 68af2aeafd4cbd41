//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use dealerbook_core::{ChartError, LedgerError, PeriodError, StatementError};
use dealerbook_shared::AppError;

/// Maps a statement failure onto the application error taxonomy.
#[must_use]
pub fn app_error(err: StatementError) -> AppError {
    match err {
        StatementError::Period(err @ PeriodError::EndBeforeStart { .. }) => {
            AppError::Validation(err.to_string())
        }
        StatementError::Chart(ChartError::ConfigNotFound(tenant_id)) => {
            AppError::NotFound(format!("no account mapping configured for tenant {tenant_id}"))
        }
        StatementError::Chart(err @ ChartError::InvalidConfig { .. }) => {
            AppError::BusinessRule(err.to_string())
        }
        StatementError::Chart(ChartError::Store(msg)) => AppError::Database(msg),
        StatementError::Ledger(LedgerError::Timeout(after)) => {
            AppError::LedgerTimeout(format!("no answer within {after:?}"))
        }
        StatementError::Ledger(LedgerError::Unavailable(msg)) => AppError::LedgerUnavailable(msg),
        StatementError::Cancelled => AppError::Cancelled,
    }
}

/// Renders an error as `{"error": CODE, "message": ...}` with its status.
pub fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}
