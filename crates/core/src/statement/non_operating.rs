//! Other-income / non-operating extractor.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::types::{AccountLine, LineKind, NonOperatingTotals};
use crate::aggregation::AccountSums;
use crate::chart::{ChartIndex, NonOperatingKind};

const fn line_kind(kind: NonOperatingKind) -> LineKind {
    match kind {
        NonOperatingKind::RevenueAdjustment => LineKind::RevenueAdjustment,
        NonOperatingKind::OtherIncome => LineKind::OtherIncome,
        NonOperatingKind::InterestExpense => LineKind::InterestExpense,
        NonOperatingKind::FinancingIncome => LineKind::FinancingIncome,
    }
}

/// Sums each non-operating bucket with its own sign convention.
///
/// Buckets absent from `sums` are zero. These figures never touch department
/// gross profit.
#[must_use]
pub fn extract(
    index: &ChartIndex,
    sums: &BTreeMap<NonOperatingKind, AccountSums>,
    detail: bool,
) -> NonOperatingTotals {
    let mut totals = NonOperatingTotals::default();
    let mut lines = Vec::new();

    for kind in NonOperatingKind::ALL {
        let bucket = sums.get(&kind);
        let mut bucket_total = Decimal::ZERO;
        for account_no in index.non_operating_accounts(kind) {
            let ledger_amount = bucket
                .and_then(|b| b.get(account_no))
                .copied()
                .unwrap_or(Decimal::ZERO);
            let line = AccountLine::new(
                account_no,
                index.description(account_no),
                line_kind(kind),
                kind.normal_balance(),
                ledger_amount,
            );
            bucket_total += line.amount;
            lines.push(line);
        }

        match kind {
            NonOperatingKind::RevenueAdjustment => totals.revenue_adjustment = bucket_total,
            NonOperatingKind::OtherIncome => totals.other_income = bucket_total,
            NonOperatingKind::InterestExpense => totals.interest_expense = bucket_total,
            NonOperatingKind::FinancingIncome => totals.financing_income = bucket_total,
        }
    }

    totals.lines = detail.then_some(lines);
    totals
}
