//! Overhead expense aggregation and the reconciliation scan.

use rust_decimal::Decimal;

use super::types::{AccountLine, ExpenseCategoryTotal, LineKind, OverheadStatement, UnmappedAccountWarning};
use crate::aggregation::AccountSums;
use crate::chart::{ChartIndex, NormalBalance};

/// Builds the overhead block.
///
/// `category_sums[i]` holds the ledger sums of the chart accounts in the
/// i-th expense category. Expenses are debits and used as-is. Every non-zero
/// entry of `unmapped_sums` becomes a warning; the warnings only reach the
/// grand total when `include_unmapped` is set.
#[must_use]
pub fn compute_overhead(
    index: &ChartIndex,
    category_sums: &[AccountSums],
    unmapped_sums: &AccountSums,
    include_unmapped: bool,
    detail: bool,
) -> OverheadStatement {
    let categories: Vec<ExpenseCategoryTotal> = index
        .chart()
        .expense_categories
        .iter()
        .enumerate()
        .map(|(idx, category)| {
            let empty = AccountSums::new();
            let sums = category_sums.get(idx).unwrap_or(&empty);
            let lines: Vec<AccountLine> = index
                .expense_accounts(idx)
                .iter()
                .map(|account_no| {
                    AccountLine::new(
                        account_no,
                        index.description(account_no),
                        LineKind::Expense,
                        NormalBalance::Debit,
                        sums.get(account_no).copied().unwrap_or(Decimal::ZERO),
                    )
                })
                .collect();
            ExpenseCategoryTotal {
                name: category.name.clone(),
                total: lines.iter().map(|l| l.amount).sum(),
                lines: detail.then_some(lines),
            }
        })
        .collect();

    let unmapped = unmapped_warnings(index, unmapped_sums);
    let categories_total: Decimal = categories.iter().map(|c| c.total).sum();
    let unmapped_total: Decimal = unmapped.iter().map(|w| w.amount).sum();
    let grand_total = if include_unmapped {
        categories_total + unmapped_total
    } else {
        categories_total
    };

    OverheadStatement {
        categories,
        categories_total,
        unmapped,
        unmapped_total,
        unmapped_included: include_unmapped,
        grand_total,
    }
}

/// Non-zero unmapped activity, ordered by account number.
#[must_use]
pub fn unmapped_warnings(index: &ChartIndex, sums: &AccountSums) -> Vec<UnmappedAccountWarning> {
    sums.iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(account_no, amount)| UnmappedAccountWarning {
            account_no: account_no.clone(),
            description: index.description(account_no).to_string(),
            amount: *amount,
        })
        .collect()
}
