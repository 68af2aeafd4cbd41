//! Account mapping registry.
//!
//! Maps GL account numbers to department categories (exact match) and to
//! overhead and non-operating blocks (range match), per tenant.

pub mod error;
pub mod index;
pub mod registry;
pub mod types;

pub use error::ChartError;
pub use index::{AccountClass, CategoryDefinition, ChartIndex};
pub use registry::{ChartStore, MappingRegistry};
pub use types::{
    AccountMapping, AccountRange, AccountRole, AllocationTable, DealershipInfo, Department,
    DepartmentGrouping, ExpenseCategory, GlAccount, NonOperatingKind, NonOperatingRanges,
    NormalBalance, TenantChart,
};
