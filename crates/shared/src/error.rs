//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation (e.g. inconsistent tenant configuration).
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Ledger store did not answer in time.
    #[error("Ledger query timed out: {0}")]
    LedgerTimeout(String),

    /// Ledger store could not be reached.
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// The caller went away before the statement was complete.
    #[error("Request cancelled")]
    Cancelled,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::LedgerTimeout(_) => 504,
            Self::LedgerUnavailable(_) | Self::Cancelled => 503,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::LedgerTimeout(_) => "LEDGER_TIMEOUT",
            Self::LedgerUnavailable(_) => "LEDGER_UNAVAILABLE",
            Self::Cancelled => "REQUEST_CANCELLED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if repeating the request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerTimeout(_) | Self::LedgerUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::BusinessRule(String::new()), 422, "BUSINESS_RULE_VIOLATION")]
    #[case(AppError::LedgerTimeout(String::new()), 504, "LEDGER_TIMEOUT")]
    #[case(AppError::LedgerUnavailable(String::new()), 503, "LEDGER_UNAVAILABLE")]
    #[case(AppError::Cancelled, 503, "REQUEST_CANCELLED")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_status_and_code(#[case] error: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
    }

    #[test]
    fn test_only_ledger_errors_are_retryable() {
        assert!(AppError::LedgerTimeout("30s".into()).is_retryable());
        assert!(AppError::LedgerUnavailable("down".into()).is_retryable());
        assert!(!AppError::Validation("bad".into()).is_retryable());
        assert!(!AppError::NotFound("tenant".into()).is_retryable());
        assert!(!AppError::Cancelled.is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("msg".into()).to_string(),
            "Not found: msg"
        );
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::LedgerTimeout("msg".into()).to_string(),
            "Ledger query timed out: msg"
        );
        assert_eq!(AppError::Cancelled.to_string(), "Request cancelled");
    }
}
