//! Period resolution.
//!
//! Decides whether a requested date range can be answered from the closed
//! monthly summary or has to be aggregated from transaction detail.

pub mod error;
pub mod resolver;

pub use error::PeriodError;
pub use resolver::{
    PeriodMode, PeriodQuery, ResolvedPeriod, is_closed_month, last_day_of_month,
    months_in_period, resolve,
};
