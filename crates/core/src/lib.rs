//! Core business logic for Dealerbook.
//!
//! This crate contains the GL statement engine with ZERO web or database dependencies.
//! The ledger and the tenant configuration store are reached through traits
//! implemented by the db crate.
//!
//! # Modules
//!
//! - `chart` - Tenant chart of accounts and the account mapping registry
//! - `period` - Closed-month detection and ledger source selection
//! - `aggregation` - Per-account ledger sums behind the ledger query interface
//! - `statement` - Department, consolidated, overhead and bottom-line figures

pub mod aggregation;
pub mod chart;
pub mod period;
pub mod statement;

#[cfg(test)]
mod testing;

pub use aggregation::{LedgerError, LedgerQuery};
pub use chart::{ChartError, ChartStore, MappingRegistry, TenantChart};
pub use period::PeriodError;
pub use statement::{EngineOptions, Report, StatementEngine, StatementError};
