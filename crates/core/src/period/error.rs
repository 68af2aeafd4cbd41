//! Period error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Period-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    /// End date before start date.
    #[error("Invalid period: start {start} is after end {end}")]
    EndBeforeStart {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },
}
