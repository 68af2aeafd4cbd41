//! Statement generation error types.

use thiserror::Error;

use crate::aggregation::LedgerError;
use crate::chart::ChartError;
use crate::period::PeriodError;

/// Errors that abort a statement. A statement is never returned partially.
#[derive(Debug, Error)]
pub enum StatementError {
    /// Tenant configuration missing, invalid or unreadable.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Rejected period, raised before any ledger query.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// Ledger timeout or unavailability.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The caller cancelled the request.
    #[error("statement generation was cancelled")]
    Cancelled,
}

impl StatementError {
    /// Whether re-running the whole statement may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Ledger(_))
    }
}
