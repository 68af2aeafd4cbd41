//! Consolidation and roll-up.

use rust_decimal::Decimal;

use super::types::{CategoryTotal, ConsolidatedStatement, DepartmentStatement, GroupingTotal, margin};
use crate::chart::DepartmentGrouping;

/// Sums every department into the company-wide figures.
///
/// All departments count toward the grand total regardless of which
/// groupings they belong to. `sales_adjustment` is the net contra-revenue
/// contribution and may be negative. Averages are zero when `months` is zero.
#[must_use]
pub fn consolidate(
    departments: &[DepartmentStatement],
    sales_adjustment: Decimal,
    groupings: &[DepartmentGrouping],
    months: u32,
) -> ConsolidatedStatement {
    let departments_total: CategoryTotal = departments.iter().map(|d| d.totals).sum();
    let grand_total = CategoryTotal::new(
        departments_total.sales + sales_adjustment,
        departments_total.cogs,
    );

    let groupings = groupings
        .iter()
        .map(|grouping| grouping_total(departments, grouping))
        .collect();

    ConsolidatedStatement {
        departments_total,
        sales_adjustment,
        grand_total,
        gross_margin: grand_total.margin(),
        groupings,
        months,
        average_monthly_sales_gp: average_monthly(grand_total.sales, months),
        average_monthly_gross_profit: average_monthly(grand_total.gross_profit, months),
    }
}

/// Totals for the departments of one grouping, exactly as configured.
#[must_use]
pub fn grouping_total(
    departments: &[DepartmentStatement],
    grouping: &DepartmentGrouping,
) -> GroupingTotal {
    let totals: CategoryTotal = departments
        .iter()
        .filter(|d| grouping.departments.contains(&d.department))
        .map(|d| d.totals)
        .sum();
    GroupingTotal {
        name: grouping.name.clone(),
        departments: grouping.departments.clone(),
        totals,
        gross_margin: totals.margin(),
    }
}

/// `amount / months`, zero for a zero month count.
#[must_use]
pub fn average_monthly(amount: Decimal, months: u32) -> Decimal {
    margin(amount, Decimal::from(months))
}
