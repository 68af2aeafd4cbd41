//! Ledger access error types.

use std::time::Duration;

use thiserror::Error;

/// Failures of the external ledger query interface.
///
/// Both variants are transient: a statement is side-effect free, so the whole
/// generation can be retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger did not answer within the configured timeout.
    #[error("ledger query timed out after {0:?}")]
    Timeout(Duration),

    /// The ledger could not be reached or rejected the query.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
