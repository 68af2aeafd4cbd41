//! Departmental financial statements.
//!
//! Components, leaf-first:
//! - `category` - department category calculator
//! - `consolidation` - department and company roll-up
//! - `overhead` - overhead expense aggregation and reconciliation gaps
//! - `allocation` - overhead allocation with a G&A remainder
//! - `non_operating` - other income, interest and financing
//! - `assembler` - joins everything into a [`Report`]
//! - `engine` - period resolution, ledger fan-out and the public entry point

pub mod allocation;
pub mod assembler;
pub mod category;
pub mod consolidation;
pub mod engine;
pub mod error;
pub mod non_operating;
pub mod overhead;
pub mod types;


pub use allocation::{allocate, allocation_statement, present};
pub use assembler::{StatementParts, assemble};
pub use category::{compute_category, department_statement};
pub use consolidation::{average_monthly, consolidate, grouping_total};
pub use engine::{EngineOptions, StatementEngine, local_today};
pub use error::StatementError;
pub use non_operating::extract;
pub use overhead::{compute_overhead, unmapped_warnings};
pub use types::*;
