//! Tenant chart configuration types.
//!
//! A [`TenantChart`] is everything the engine knows about one dealership's
//! chart of accounts: which discrete accounts feed which department category,
//! which account blocks are overhead or non-operating, and how overhead is
//! spread across departments.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealerbook_shared::TenantId;

/// Business department of a dealership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    /// New equipment sales.
    NewEquipment,
    /// Used equipment sales.
    UsedEquipment,
    /// Rental fleet.
    Rental,
    /// Service (labor, warranty, sublet).
    Service,
    /// Parts counter and shop parts.
    Parts,
    /// Trucking / transportation.
    Trucking,
    /// Reserved residual department absorbing unallocated overhead.
    GeneralAdministrative,
}

impl Department {
    /// Revenue-producing departments, in statement order.
    pub const OPERATING: [Self; 6] = [
        Self::NewEquipment,
        Self::UsedEquipment,
        Self::Rental,
        Self::Service,
        Self::Parts,
        Self::Trucking,
    ];

    /// Returns the snake_case name used in configuration and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewEquipment => "new_equipment",
            Self::UsedEquipment => "used_equipment",
            Self::Rental => "rental",
            Self::Service => "service",
            Self::Parts => "parts",
            Self::Trucking => "trucking",
            Self::GeneralAdministrative => "general_administrative",
        }
    }

    /// Returns true for the G&A department, which can never be configured directly.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(self, Self::GeneralAdministrative)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new_equipment" => Ok(Self::NewEquipment),
            "used_equipment" => Ok(Self::UsedEquipment),
            "rental" => Ok(Self::Rental),
            "service" => Ok(Self::Service),
            "parts" => Ok(Self::Parts),
            "trucking" => Ok(Self::Trucking),
            "general_administrative" | "g&a" | "ga" => Ok(Self::GeneralAdministrative),
            _ => Err(format!("Unknown department: {s}")),
        }
    }
}

/// Side of a department category an account feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Sales account (credit-stored).
    Revenue,
    /// Cost of sales account (debit-stored).
    Cost,
}

impl AccountRole {
    /// Normal balance of accounts playing this role.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Revenue => NormalBalance::Credit,
            Self::Cost => NormalBalance::Debit,
        }
    }
}

impl FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "revenue" | "sales" => Ok(Self::Revenue),
            "cost" | "cogs" => Ok(Self::Cost),
            _ => Err(format!("Unknown account role: {s}")),
        }
    }
}

/// Side of the ledger an account normally carries its balance on.
///
/// Credits are stored negative, so credit-normal accounts are negated to
/// become positive statement figures. Debit-normal accounts are used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalBalance {
    /// Credit-normal (revenue, other income).
    Credit,
    /// Debit-normal (cost, expense).
    Debit,
}

impl NormalBalance {
    /// Converts a raw signed ledger sum into its statement figure.
    #[must_use]
    pub fn apply(self, ledger_amount: Decimal) -> Decimal {
        match self {
            Self::Credit => -ledger_amount,
            Self::Debit => ledger_amount,
        }
    }
}

/// Exact-match mapping of one GL account into a department category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMapping {
    /// GL account number.
    pub account_no: String,
    /// Department the account belongs to.
    pub department: Department,
    /// Revenue or cost side.
    pub role: AccountRole,
    /// Category key (e.g. `new_lift_truck_primary`).
    pub category: String,
    /// Human readable category label.
    #[serde(default)]
    pub category_label: String,
}

/// Inclusive block of numeric account numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountRange {
    /// Lowest account number in the block.
    pub low: u64,
    /// Highest account number in the block.
    pub high: u64,
}

impl AccountRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// Returns true if the account number parses as a number inside this block.
    ///
    /// Non-numeric account numbers never match a range.
    #[must_use]
    pub fn contains(&self, account_no: &str) -> bool {
        account_no
            .trim()
            .parse::<u64>()
            .is_ok_and(|n| n >= self.low && n <= self.high)
    }

    /// Returns true if the two blocks share at least one account number.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

impl fmt::Display for AccountRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Overhead expense category made of account blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    /// Category name (e.g. "Salaries & Wages").
    pub name: String,
    /// Account blocks belonging to this category.
    pub account_ranges: Vec<AccountRange>,
}

/// Non-operating bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonOperatingKind {
    /// Contra-revenue items (cash discounts etc.) folded into consolidated sales.
    RevenueAdjustment,
    /// Other income.
    OtherIncome,
    /// Interest expense.
    InterestExpense,
    /// Financing income.
    FinancingIncome,
}

impl NonOperatingKind {
    /// All kinds, in report order.
    pub const ALL: [Self; 4] = [
        Self::RevenueAdjustment,
        Self::OtherIncome,
        Self::InterestExpense,
        Self::FinancingIncome,
    ];

    /// Sign convention of the accounts in this bucket.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::InterestExpense => NormalBalance::Debit,
            Self::RevenueAdjustment | Self::OtherIncome | Self::FinancingIncome => {
                NormalBalance::Credit
            }
        }
    }

    /// Returns the snake_case name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RevenueAdjustment => "revenue_adjustment",
            Self::OtherIncome => "other_income",
            Self::InterestExpense => "interest_expense",
            Self::FinancingIncome => "financing_income",
        }
    }
}

impl FromStr for NonOperatingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown non-operating kind: {s}"))
    }
}

/// Account blocks outside the revenue/cost chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonOperatingRanges {
    /// Contra-revenue blocks added to consolidated sales.
    #[serde(default)]
    pub revenue_adjustments: Vec<AccountRange>,
    /// Other income blocks.
    #[serde(default)]
    pub other_income: Vec<AccountRange>,
    /// Interest expense blocks.
    #[serde(default)]
    pub interest_expense: Vec<AccountRange>,
    /// Financing income blocks.
    #[serde(default)]
    pub financing_income: Vec<AccountRange>,
}

impl NonOperatingRanges {
    /// Returns the blocks configured for a bucket.
    #[must_use]
    pub fn ranges(&self, kind: NonOperatingKind) -> &[AccountRange] {
        match kind {
            NonOperatingKind::RevenueAdjustment => &self.revenue_adjustments,
            NonOperatingKind::OtherIncome => &self.other_income,
            NonOperatingKind::InterestExpense => &self.interest_expense,
            NonOperatingKind::FinancingIncome => &self.financing_income,
        }
    }

    /// Mutable access used while assembling a chart from storage rows.
    pub fn ranges_mut(&mut self, kind: NonOperatingKind) -> &mut Vec<AccountRange> {
        match kind {
            NonOperatingKind::RevenueAdjustment => &mut self.revenue_adjustments,
            NonOperatingKind::OtherIncome => &mut self.other_income,
            NonOperatingKind::InterestExpense => &mut self.interest_expense,
            NonOperatingKind::FinancingIncome => &mut self.financing_income,
        }
    }
}

/// Fixed overhead allocation weights.
///
/// Weights are fractions (`0.20` = 20%). Whatever is not allocated goes to the
/// implicit G&A department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationTable {
    /// Department weights.
    pub weights: BTreeMap<Department, Decimal>,
}

impl AllocationTable {
    /// Builds a table from `(department, weight)` pairs.
    #[must_use]
    pub fn from_weights(weights: impl IntoIterator<Item = (Department, Decimal)>) -> Self {
        Self {
            weights: weights.into_iter().collect(),
        }
    }

    /// Sum of all configured weights.
    #[must_use]
    pub fn allocated_weight(&self) -> Decimal {
        self.weights.values().copied().sum()
    }

    /// Weight left over for G&A.
    #[must_use]
    pub fn general_administrative_weight(&self) -> Decimal {
        Decimal::ONE - self.allocated_weight()
    }
}

/// Named set of departments reported together (e.g. "aftermarket").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentGrouping {
    /// Grouping name.
    pub name: String,
    /// Member departments.
    pub departments: Vec<Department>,
}

/// Chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlAccount {
    /// GL account number.
    pub account_no: String,
    /// Account description.
    #[serde(default)]
    pub description: String,
}

/// Dealership metadata shown on the statement header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealershipInfo {
    /// Legal or trading name.
    pub name: String,
    /// Short code.
    #[serde(default)]
    pub code: String,
}

/// Complete statement configuration for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantChart {
    /// Tenant this configuration belongs to.
    pub tenant_id: TenantId,
    /// Statement header metadata.
    pub dealership: DealershipInfo,
    /// Chart of accounts.
    #[serde(default)]
    pub accounts: Vec<GlAccount>,
    /// Account blocks scanned for unmapped activity.
    #[serde(default)]
    pub statement_span: Vec<AccountRange>,
    /// Department revenue/cost mappings.
    pub mappings: Vec<AccountMapping>,
    /// Overhead expense categories.
    #[serde(default)]
    pub expense_categories: Vec<ExpenseCategory>,
    /// Non-operating blocks.
    #[serde(default)]
    pub non_operating: NonOperatingRanges,
    /// Overhead allocation weights.
    #[serde(default)]
    pub allocation: AllocationTable,
    /// Department groupings.
    #[serde(default)]
    pub groupings: Vec<DepartmentGrouping>,
    /// Grouping used as the numerator of the absorption rate.
    #[serde(default)]
    pub absorption_grouping: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("600000", true)]
    #[case("612345", true)]
    #[case("699999", true)]
    #[case("700000", false)]
    #[case("599999", false)]
    #[case(" 650000 ", true)]
    #[case("65A000", false)]
    #[case("", false)]
    fn test_range_contains(#[case] account: &str, #[case] expected: bool) {
        assert_eq!(AccountRange::new(600_000, 699_999).contains(account), expected);
    }

    #[test]
    fn test_range_overlap() {
        let a = AccountRange::new(600_000, 609_999);
        assert!(a.overlaps(&AccountRange::new(609_999, 619_999)));
        assert!(a.overlaps(&AccountRange::new(605_000, 606_000)));
        assert!(!a.overlaps(&AccountRange::new(610_000, 619_999)));
    }

    #[test]
    fn test_normal_balance_sign_flip() {
        assert_eq!(NormalBalance::Credit.apply(dec!(-1000)), dec!(1000));
        assert_eq!(NormalBalance::Debit.apply(dec!(400)), dec!(400));
        assert_eq!(AccountRole::Revenue.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountRole::Cost.normal_balance(), NormalBalance::Debit);
        assert_eq!(
            NonOperatingKind::InterestExpense.normal_balance(),
            NormalBalance::Debit
        );
        assert_eq!(
            NonOperatingKind::FinancingIncome.normal_balance(),
            NormalBalance::Credit
        );
    }

    #[test]
    fn test_department_round_trips_through_str() {
        for department in Department::OPERATING {
            assert_eq!(department.as_str().parse::<Department>(), Ok(department));
        }
        assert_eq!(
            "G&A".parse::<Department>(),
            Ok(Department::GeneralAdministrative)
        );
        assert!("showroom".parse::<Department>().is_err());
    }

    #[test]
    fn test_non_operating_kind_from_str() {
        for kind in NonOperatingKind::ALL {
            assert_eq!(kind.as_str().parse::<NonOperatingKind>(), Ok(kind));
        }
        assert!("dividends".parse::<NonOperatingKind>().is_err());
    }

    #[test]
    fn test_allocation_table_remainder() {
        let table = AllocationTable::from_weights([
            (Department::Parts, dec!(0.20)),
            (Department::Service, dec!(0.30)),
        ]);
        assert_eq!(table.allocated_weight(), dec!(0.50));
        assert_eq!(table.general_administrative_weight(), dec!(0.50));
    }

    #[test]
    fn test_department_serializes_snake_case() {
        let json = serde_json::to_string(&Department::NewEquipment).unwrap();
        assert_eq!(json, "\"new_equipment\"");
    }
}
