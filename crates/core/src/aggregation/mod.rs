//! Transaction aggregation.
//!
//! Sums signed ledger amounts per account from either the monthly summary or
//! posted transaction detail, as decided by the period resolver.

pub mod aggregator;
pub mod error;
pub mod query;

pub use aggregator::{AccountSums, TransactionAggregator};
pub use error::LedgerError;
pub use query::LedgerQuery;
