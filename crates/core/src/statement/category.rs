//! Department category calculator.

use rust_decimal::Decimal;

use super::types::{AccountLine, CategoryStatement, CategoryTotal, DepartmentStatement, LineKind};
use crate::aggregation::AccountSums;
use crate::chart::{AccountRole, CategoryDefinition, ChartIndex, Department};

/// Partitions one category's account sums into sales and cost of sales.
///
/// Revenue accounts contribute their negated sum to sales, cost accounts their
/// sum as-is to cogs. Accounts missing from `sums` count as zero, so a category
/// the tenant never posts to comes out as a zero total.
#[must_use]
pub fn compute_category(
    index: &ChartIndex,
    definition: &CategoryDefinition,
    sums: &AccountSums,
    detail: bool,
) -> CategoryStatement {
    let mut lines = Vec::with_capacity(definition.revenue_accounts.len() + definition.cost_accounts.len());
    let legs = [
        (AccountRole::Revenue, &definition.revenue_accounts),
        (AccountRole::Cost, &definition.cost_accounts),
    ];
    for (role, accounts) in legs {
        let kind = match role {
            AccountRole::Revenue => LineKind::Revenue,
            AccountRole::Cost => LineKind::Cost,
        };
        for account_no in accounts {
            let ledger_amount = sums.get(account_no).copied().unwrap_or(Decimal::ZERO);
            lines.push(AccountLine::new(
                account_no,
                index.description(account_no),
                kind,
                role.normal_balance(),
                ledger_amount,
            ));
        }
    }

    let leg_total = |kind: LineKind| -> Decimal {
        lines
            .iter()
            .filter(|line| line.kind == kind)
            .map(|line| line.amount)
            .sum()
    };
    let totals = CategoryTotal::new(leg_total(LineKind::Revenue), leg_total(LineKind::Cost));

    CategoryStatement {
        key: definition.key.clone(),
        label: definition.label.clone(),
        totals,
        gross_margin: totals.margin(),
        lines: detail.then_some(lines),
    }
}

/// Rolls categories up into their department block.
///
/// Overhead is applied later by the assembler; until then operating profit
/// equals gross profit.
#[must_use]
pub fn department_statement(
    department: Department,
    categories: Vec<CategoryStatement>,
) -> DepartmentStatement {
    let totals: CategoryTotal = categories.iter().map(|c| c.totals).sum();
    DepartmentStatement {
        department,
        categories,
        totals,
        gross_margin: totals.margin(),
        allocated_overhead: Decimal::ZERO,
        operating_profit: totals.gross_profit,
    }
}
