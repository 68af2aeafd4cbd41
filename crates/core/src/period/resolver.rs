//! Closed-month detection and source selection.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use dealerbook_shared::TenantId;

use super::error::PeriodError;

/// Which ledger source answers a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PeriodMode {
    /// Pre-closed monthly summary for one calendar month.
    MonthlySummary {
        /// Calendar year.
        year: i32,
        /// Calendar month (1-12).
        month: u32,
    },
    /// Posted transaction detail over the raw date range.
    TransactionDetail,
}

/// A statement request period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodQuery {
    /// Tenant requesting the statement.
    pub tenant_id: TenantId,
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
}

impl PeriodQuery {
    /// Whether this period is a fully-bounded month strictly before `today`'s month.
    ///
    /// Recomputed on every call; never stored.
    #[must_use]
    pub fn is_closed_month(&self, today: NaiveDate) -> bool {
        is_closed_month(self.start_date, self.end_date, today)
    }

    /// Resolves the query's source mode as of `today`.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::EndBeforeStart`] for an inverted range.
    pub fn resolve(&self, today: NaiveDate) -> Result<ResolvedPeriod, PeriodError> {
        resolve(self.start_date, self.end_date, today)
    }
}

/// A period with its source decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPeriod {
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Source mode.
    #[serde(flatten)]
    pub mode: PeriodMode,
}

impl ResolvedPeriod {
    /// Number of calendar months the period touches.
    #[must_use]
    pub fn months(&self) -> u32 {
        months_in_period(self.start_date, self.end_date)
    }
}

/// Last calendar day of a month.
#[must_use]
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Returns true only for a full calendar month strictly before `today`'s month.
///
/// The current month is still open, so it never qualifies, even when the
/// boundaries match and `today` is its last day.
#[must_use]
pub fn is_closed_month(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> bool {
    if start.day() != 1 {
        return false;
    }
    if (start.year(), start.month()) != (end.year(), end.month()) {
        return false;
    }
    if last_day_of_month(start.year(), start.month()) != Some(end) {
        return false;
    }
    (start.year(), start.month()) < (today.year(), today.month())
}

/// Picks the ledger source for a date range.
///
/// # Errors
///
/// Returns [`PeriodError::EndBeforeStart`] when `end` precedes `start`. This is
/// checked before any ledger query is issued.
pub fn resolve(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<ResolvedPeriod, PeriodError> {
    if end < start {
        return Err(PeriodError::EndBeforeStart { start, end });
    }

    let mode = if is_closed_month(start, end, today) {
        PeriodMode::MonthlySummary {
            year: start.year(),
            month: start.month(),
        }
    } else {
        PeriodMode::TransactionDetail
    };

    Ok(ResolvedPeriod {
        start_date: start,
        end_date: end,
        mode,
    })
}

/// Number of calendar months touched by `start..=end`; 0 for an inverted range.
#[must_use]
pub fn months_in_period(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    #[allow(clippy::cast_possible_wrap)]
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32 + 1;
    u32::try_from(months).unwrap_or(0)
}
