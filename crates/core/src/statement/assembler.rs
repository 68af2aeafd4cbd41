//! Report assembler. Pure composition, no I/O.

use rust_decimal::Decimal;

use dealerbook_shared::TenantId;

use super::types::{
    AllocationStatement, BottomLine, ConsolidatedStatement, DepartmentStatement,
    NonOperatingTotals, OverheadStatement, PeriodMetadata, Report,
};
use crate::chart::DealershipInfo;

/// Everything computed for one statement, ready to be joined.
#[derive(Debug, Clone)]
pub struct StatementParts {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Dealership header.
    pub dealership: DealershipInfo,
    /// Period.
    pub period: PeriodMetadata,
    /// Department blocks before overhead allocation.
    pub departments: Vec<DepartmentStatement>,
    /// Company-wide roll-up.
    pub consolidated: ConsolidatedStatement,
    /// Overhead block.
    pub overhead: OverheadStatement,
    /// Allocation block.
    pub allocation: AllocationStatement,
    /// Non-operating figures.
    pub non_operating: NonOperatingTotals,
    /// Grouping whose gross profit feeds the absorption rate.
    pub absorption_grouping: Option<String>,
}

/// Joins the parts into a [`Report`].
///
/// Applies each department's allocated overhead and computes the bottom line:
///
/// - `total_operating_profit = gross_profit - overhead + other_income + interest_expense`
/// - `pre_tax_income = total_operating_profit + financing_income`
#[must_use]
pub fn assemble(parts: StatementParts) -> Report {
    let StatementParts {
        tenant_id,
        dealership,
        period,
        mut departments,
        consolidated,
        overhead,
        allocation,
        non_operating,
        absorption_grouping,
    } = parts;

    for department in &mut departments {
        let share = allocation
            .shares
            .iter()
            .find(|s| s.department == department.department)
            .map_or(Decimal::ZERO, |s| s.amount);
        department.allocated_overhead = share;
        department.operating_profit = department.totals.gross_profit - share;
    }

    let gross_profit = consolidated.grand_total.gross_profit;
    let total_operating_profit = gross_profit - overhead.grand_total
        + non_operating.other_income
        + non_operating.interest_expense;
    let pre_tax_income = total_operating_profit + non_operating.financing_income;

    let absorption_rate = absorption_grouping
        .as_deref()
        .and_then(|name| consolidated.groupings.iter().find(|g| g.name == name))
        .and_then(|grouping| grouping.totals.gross_profit.checked_div(overhead.grand_total));

    let bottom_line = BottomLine {
        gross_profit,
        overhead: overhead.grand_total,
        total_operating_profit,
        pre_tax_income,
        absorption_rate,
    };

    Report {
        tenant_id,
        dealership,
        period,
        departments,
        consolidated,
        overhead,
        allocation,
        non_operating,
        bottom_line,
    }
}
