//! Repository implementations of the core storage traits.

pub mod chart;
pub mod ledger;

pub use chart::TenantChartRepository;
pub use ledger::{LedgerRepository, NewGlTransaction};
