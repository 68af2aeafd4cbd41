//! `SeaORM` entity definitions.
//!
//! Ledger tables (`gl_transactions`, `gl_monthly_summaries`) are read through
//! parameterized statements in [`crate::repositories::ledger`]; the entities
//! are used for writes and for loading tenant configuration.

pub mod account_mappings;
pub mod account_ranges;
pub mod allocation_weights;
pub mod department_groupings;
pub mod expense_categories;
pub mod expense_category_ranges;
pub mod gl_accounts;
pub mod gl_monthly_summaries;
pub mod gl_transactions;
pub mod tenants;
