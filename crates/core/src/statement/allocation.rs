//! Department expense allocator.
//!
//! Shares are computed exactly. The G&A share is the overhead total minus
//! every configured share, so the shares always sum to the total. Rounding
//! only happens in [`present`], using the Largest Remainder Method:
//!
//! 1. Round the total to the target precision
//! 2. Truncate each exact share
//! 3. Hand the leftover units to the shares that lost the most

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{AllocationShare, AllocationStatement};
use crate::chart::{AllocationTable, Department};

/// Spreads `overhead_total` across departments by weight.
///
/// Every configured department gets `total * weight`; G&A gets the rest.
#[must_use]
pub fn allocate(overhead_total: Decimal, table: &AllocationTable) -> BTreeMap<Department, Decimal> {
    let mut shares: BTreeMap<Department, Decimal> = table
        .weights
        .iter()
        .map(|(department, weight)| (*department, overhead_total * *weight))
        .collect();
    let allocated: Decimal = shares.values().copied().sum();
    shares.insert(Department::GeneralAdministrative, overhead_total - allocated);
    shares
}

/// Builds the report's allocation block with presented (rounded) shares.
#[must_use]
pub fn allocation_statement(
    overhead_total: Decimal,
    table: &AllocationTable,
    decimal_places: u32,
) -> AllocationStatement {
    let shares = allocate(overhead_total, table);
    let exact: Vec<Decimal> = shares.values().copied().collect();
    let (presented_total, presented) = present(&exact, decimal_places);

    let shares = shares
        .into_iter()
        .zip(presented)
        .map(|((department, amount), presented)| AllocationShare {
            department,
            weight: if department.is_reserved() {
                table.general_administrative_weight()
            } else {
                table.weights.get(&department).copied().unwrap_or(Decimal::ZERO)
            },
            amount,
            presented,
        })
        .collect();

    AllocationStatement {
        overhead_total,
        presented_total,
        shares,
    }
}

/// Rounds `amounts` to `decimal_places` so they still sum to their rounded total.
///
/// Precision beyond [`Decimal::MAX_SCALE`] is capped there.
/// Returns the rounded total and the rounded amounts, in input order.
#[must_use]
pub fn present(amounts: &[Decimal], decimal_places: u32) -> (Decimal, Vec<Decimal>) {
    let decimal_places = decimal_places.min(Decimal::MAX_SCALE);
    let total: Decimal = amounts.iter().copied().sum();
    let total_rounded =
        total.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);
    if amounts.is_empty() {
        return (total_rounded, Vec::new());
    }

    let unit = Decimal::new(1, decimal_places);
    let mut rounded: Vec<Decimal> = amounts
        .iter()
        .map(|a| a.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero))
        .collect();

    let remainder = total_rounded - rounded.iter().copied().sum::<Decimal>();
    let units = (remainder / unit).trunc().abs().to_u64().unwrap_or(0);
    let units = usize::try_from(units).unwrap_or(0);
    if units == 0 {
        return (total_rounded, rounded);
    }
    let step = if remainder.is_sign_negative() { -unit } else { unit };

    // Largest truncation loss first; ties keep input order.
    let mut order: Vec<usize> = (0..amounts.len()).collect();
    order.sort_by(|a, b| {
        let loss_a = (amounts[*a] - rounded[*a]).abs();
        let loss_b = (amounts[*b] - rounded[*b]).abs();
        loss_b.cmp(&loss_a)
    });

    for idx in order.into_iter().cycle().take(units) {
        rounded[idx] += step;
    }
    (total_rounded, rounded)
}
