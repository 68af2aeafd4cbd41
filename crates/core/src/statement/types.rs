//! Statement data types.
//!
//! Every type here is a value object built fresh for one request. Money is
//! carried as exact [`Decimal`]; maps are ordered so identical inputs
//! serialize to identical bytes.

use std::iter::Sum;
use std::ops::Add;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealerbook_shared::TenantId;

use crate::chart::{DealershipInfo, Department, NormalBalance};
use crate::period::PeriodMode;

/// Sales, cost of sales and the derived gross profit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Sales (credits negated to positive).
    pub sales: Decimal,
    /// Cost of goods sold.
    pub cogs: Decimal,
    /// `sales - cogs`, never an independent input.
    pub gross_profit: Decimal,
}

impl CategoryTotal {
    /// Builds a total, deriving gross profit.
    #[must_use]
    pub fn new(sales: Decimal, cogs: Decimal) -> Self {
        Self {
            sales,
            cogs,
            gross_profit: sales - cogs,
        }
    }

    /// Gross profit over sales; zero when there are no sales.
    #[must_use]
    pub fn margin(&self) -> Decimal {
        margin(self.gross_profit, self.sales)
    }
}

impl Add for CategoryTotal {
    type Output = Self;

    // Gross profit is re-derived from the summed legs.
    fn add(self, rhs: Self) -> Self {
        Self::new(self.sales + rhs.sales, self.cogs + rhs.cogs)
    }
}

impl Sum for CategoryTotal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a CategoryTotal> for CategoryTotal {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// `numerator / denominator`, zero when the denominator is zero.
#[must_use]
pub fn margin(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// What an account line contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Department revenue.
    Revenue,
    /// Department cost of sales.
    Cost,
    /// Overhead expense.
    Expense,
    /// Contra-revenue adjustment.
    RevenueAdjustment,
    /// Other income.
    OtherIncome,
    /// Interest expense.
    InterestExpense,
    /// Financing income.
    FinancingIncome,
}

/// One account's contribution, present in detail mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLine {
    /// GL account number.
    pub account_no: String,
    /// Chart description.
    pub description: String,
    /// Where the account lands.
    pub kind: LineKind,
    /// Raw signed ledger sum.
    pub ledger_amount: Decimal,
    /// Sign-adjusted statement figure.
    pub amount: Decimal,
}

impl AccountLine {
    pub(crate) fn new(
        account_no: &str,
        description: &str,
        kind: LineKind,
        balance: NormalBalance,
        ledger_amount: Decimal,
    ) -> Self {
        Self {
            account_no: account_no.to_string(),
            description: description.to_string(),
            kind,
            ledger_amount,
            amount: balance.apply(ledger_amount),
        }
    }
}

/// One department category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStatement {
    /// Category key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Category totals.
    #[serde(flatten)]
    pub totals: CategoryTotal,
    /// Gross margin.
    pub gross_margin: Decimal,
    /// Per-account lines (detail mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<AccountLine>>,
}

/// One department block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentStatement {
    /// Department.
    pub department: Department,
    /// Categories in chart order.
    pub categories: Vec<CategoryStatement>,
    /// Elementwise sum of the categories.
    pub totals: CategoryTotal,
    /// Gross profit over sales; zero without sales.
    pub gross_margin: Decimal,
    /// Overhead share assigned by the allocation table.
    pub allocated_overhead: Decimal,
    /// Gross profit less allocated overhead.
    pub operating_profit: Decimal,
}

/// Configured set of departments reported together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingTotal {
    /// Grouping name.
    pub name: String,
    /// Member departments as configured.
    pub departments: Vec<Department>,
    /// Summed totals.
    pub totals: CategoryTotal,
    /// Gross margin.
    pub gross_margin: Decimal,
}

/// Company-wide roll-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedStatement {
    /// Sum of all departments, trucking included.
    pub departments_total: CategoryTotal,
    /// Net contra-revenue folded into sales (may be negative).
    pub sales_adjustment: Decimal,
    /// Departments total plus the sales adjustment.
    pub grand_total: CategoryTotal,
    /// Grand total gross margin.
    pub gross_margin: Decimal,
    /// Configured groupings.
    pub groupings: Vec<GroupingTotal>,
    /// Calendar months in the period.
    pub months: u32,
    /// Grand total sales per month; zero when `months` is zero.
    pub average_monthly_sales_gp: Decimal,
    /// Grand total gross profit per month; zero when `months` is zero.
    pub average_monthly_gross_profit: Decimal,
}

/// One overhead expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategoryTotal {
    /// Category name.
    pub name: String,
    /// Summed debits.
    pub total: Decimal,
    /// Per-account lines (detail mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<AccountLine>>,
}

/// Activity on an account no category, range or bucket claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedAccountWarning {
    /// GL account number.
    pub account_no: String,
    /// Chart description.
    pub description: String,
    /// Raw summed ledger amount.
    pub amount: Decimal,
}

/// Overhead expense block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverheadStatement {
    /// Categories in configuration order.
    pub categories: Vec<ExpenseCategoryTotal>,
    /// Sum of the category totals.
    pub categories_total: Decimal,
    /// Reconciliation gaps, by account number.
    pub unmapped: Vec<UnmappedAccountWarning>,
    /// Sum of the gaps.
    pub unmapped_total: Decimal,
    /// Whether the gaps are part of `grand_total`.
    pub unmapped_included: bool,
    /// Overhead used for allocation and the bottom line.
    pub grand_total: Decimal,
}

/// One department's overhead share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationShare {
    /// Receiving department (G&A last).
    pub department: Department,
    /// Configured weight, or the remainder for G&A.
    pub weight: Decimal,
    /// Exact share.
    pub amount: Decimal,
    /// Share rounded for presentation; presented shares sum to `presented_total`.
    pub presented: Decimal,
}

/// Overhead allocation block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStatement {
    /// Overhead grand total being spread.
    pub overhead_total: Decimal,
    /// Overhead total rounded for presentation.
    pub presented_total: Decimal,
    /// Shares, configured departments first then G&A.
    pub shares: Vec<AllocationShare>,
}

/// Non-operating figures, each with its own sign convention applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonOperatingTotals {
    /// Contra-revenue net contribution to sales.
    pub revenue_adjustment: Decimal,
    /// Other income (credit, negated).
    pub other_income: Decimal,
    /// Interest expense (debit, as stored).
    pub interest_expense: Decimal,
    /// Financing income (credit, negated).
    pub financing_income: Decimal,
    /// Per-account lines (detail mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<AccountLine>>,
}

/// Bottom-line figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottomLine {
    /// Consolidated gross profit.
    pub gross_profit: Decimal,
    /// Overhead grand total.
    pub overhead: Decimal,
    /// Gross profit less overhead plus other income and interest expense.
    pub total_operating_profit: Decimal,
    /// Operating profit plus financing income.
    pub pre_tax_income: Decimal,
    /// Absorption grouping gross profit over overhead, when both exist.
    pub absorption_rate: Option<Decimal>,
}

/// Period the statement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodMetadata {
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Ledger source used.
    #[serde(flatten)]
    pub mode: PeriodMode,
    /// Calendar months touched.
    pub months: u32,
    /// Whether account lines are included.
    pub detail: bool,
}

/// Departmental financial statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Dealership header.
    pub dealership: DealershipInfo,
    /// Period.
    pub period: PeriodMetadata,
    /// One block per operating department.
    pub departments: Vec<DepartmentStatement>,
    /// Company-wide roll-up.
    pub consolidated: ConsolidatedStatement,
    /// Overhead expenses.
    pub overhead: OverheadStatement,
    /// Overhead allocation.
    pub allocation: AllocationStatement,
    /// Non-operating items.
    pub non_operating: NonOperatingTotals,
    /// Bottom line.
    pub bottom_line: BottomLine,
}
