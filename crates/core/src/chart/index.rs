//! Validated, lookup-ready view of a tenant chart.

use std::collections::{BTreeMap, BTreeSet};

use super::error::ChartError;
use super::types::{
    AccountMapping, AccountRange, AccountRole, Department, NonOperatingKind, TenantChart,
};

/// Revenue and cost accounts of one department category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDefinition {
    /// Category key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Owning department.
    pub department: Department,
    /// Revenue accounts, sorted.
    pub revenue_accounts: Vec<String>,
    /// Cost accounts, sorted.
    pub cost_accounts: Vec<String>,
}

impl CategoryDefinition {
    /// Union of revenue and cost accounts, sorted and deduplicated.
    #[must_use]
    pub fn accounts(&self) -> Vec<String> {
        self.revenue_accounts
            .iter()
            .chain(&self.cost_accounts)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// How an individual account participates in the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountClass<'a> {
    /// Exact department mapping.
    Department(&'a AccountMapping),
    /// Inside an overhead expense category's range (index into the chart's categories).
    Expense(usize),
    /// Inside a non-operating block.
    NonOperating(NonOperatingKind),
    /// Not covered by anything.
    Unmapped,
}

/// Account mapping registry entry for one tenant.
///
/// Built once per chart load. Construction validates the chart, so every
/// `ChartIndex` in circulation satisfies the mapping invariants.
#[derive(Debug, Clone)]
pub struct ChartIndex {
    chart: TenantChart,
    mappings: BTreeMap<String, AccountMapping>,
    categories: Vec<CategoryDefinition>,
    descriptions: BTreeMap<String, String>,
    expense_accounts: Vec<Vec<String>>,
    non_operating_accounts: BTreeMap<NonOperatingKind, Vec<String>>,
    unmapped_accounts: Vec<String>,
}

impl ChartIndex {
    /// Validates a chart and indexes it for lookups.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::InvalidConfig`] when:
    /// - an account is mapped more than once
    /// - a category spans several departments
    /// - G&A appears in a mapping, grouping or the allocation table
    /// - a range is inverted, or ranges of different categories/buckets overlap
    /// - allocation weights are negative or sum above 1
    /// - the absorption grouping is not defined
    pub fn build(chart: TenantChart) -> Result<Self, ChartError> {
        let tenant_id = chart.tenant_id;
        let invalid = |reason: String| ChartError::invalid(tenant_id, reason);

        let mut mappings = BTreeMap::new();
        let mut category_positions: BTreeMap<String, usize> = BTreeMap::new();
        let mut categories: Vec<CategoryDefinition> = Vec::new();

        for mapping in &chart.mappings {
            if mapping.department.is_reserved() {
                return Err(invalid(format!(
                    "account {} is mapped to the reserved G&A department",
                    mapping.account_no
                )));
            }
            if mappings
                .insert(mapping.account_no.clone(), mapping.clone())
                .is_some()
            {
                return Err(invalid(format!(
                    "account {} is mapped more than once",
                    mapping.account_no
                )));
            }

            let position = if let Some(&position) = category_positions.get(&mapping.category) {
                position
            } else {
                categories.push(CategoryDefinition {
                    key: mapping.category.clone(),
                    label: if mapping.category_label.is_empty() {
                        mapping.category.clone()
                    } else {
                        mapping.category_label.clone()
                    },
                    department: mapping.department,
                    revenue_accounts: Vec::new(),
                    cost_accounts: Vec::new(),
                });
                category_positions.insert(mapping.category.clone(), categories.len() - 1);
                categories.len() - 1
            };

            let category = &mut categories[position];
            if category.department != mapping.department {
                return Err(invalid(format!(
                    "category {} spans departments {} and {}",
                    category.key, category.department, mapping.department
                )));
            }
            match mapping.role {
                AccountRole::Revenue => category.revenue_accounts.push(mapping.account_no.clone()),
                AccountRole::Cost => category.cost_accounts.push(mapping.account_no.clone()),
            }
        }

        for category in &mut categories {
            category.revenue_accounts.sort();
            category.cost_accounts.sort();
        }
        categories.sort_by_key(|c| c.department);

        validate_ranges(&chart).map_err(invalid)?;
        validate_allocation(&chart).map_err(invalid)?;
        validate_groupings(&chart).map_err(invalid)?;

        let descriptions = chart
            .accounts
            .iter()
            .map(|a| (a.account_no.clone(), a.description.clone()))
            .collect();

        let mut index = Self {
            expense_accounts: vec![Vec::new(); chart.expense_categories.len()],
            non_operating_accounts: BTreeMap::new(),
            unmapped_accounts: Vec::new(),
            chart,
            mappings,
            categories,
            descriptions,
        };
        index.classify_chart_accounts();
        Ok(index)
    }

    fn classify_chart_accounts(&mut self) {
        let mut expense_accounts = vec![BTreeSet::new(); self.chart.expense_categories.len()];
        let mut non_operating: BTreeMap<NonOperatingKind, BTreeSet<String>> = BTreeMap::new();
        let mut unmapped = BTreeSet::new();

        for account in &self.chart.accounts {
            let account_no = account.account_no.clone();
            match self.classify(&account.account_no) {
                AccountClass::Department(_) => {}
                AccountClass::Expense(idx) => {
                    expense_accounts[idx].insert(account_no);
                }
                AccountClass::NonOperating(kind) => {
                    non_operating.entry(kind).or_default().insert(account_no);
                }
                AccountClass::Unmapped => {
                    if self.in_statement_span(&account.account_no) {
                        unmapped.insert(account_no);
                    }
                }
            }
        }

        self.expense_accounts = expense_accounts
            .into_iter()
            .map(|set| set.into_iter().collect())
            .collect();
        self.non_operating_accounts = non_operating
            .into_iter()
            .map(|(kind, set)| (kind, set.into_iter().collect()))
            .collect();
        self.unmapped_accounts = unmapped.into_iter().collect();
    }

    /// Whether an unclassified account is reported as a reconciliation gap.
    ///
    /// An empty statement span covers the whole chart.
    fn in_statement_span(&self, account_no: &str) -> bool {
        let span = &self.chart.statement_span;
        span.is_empty() || span.iter().any(|r| r.contains(account_no))
    }

    /// Classifies an account. Exact mappings win over range matches.
    #[must_use]
    pub fn classify(&self, account_no: &str) -> AccountClass<'_> {
        if let Some(mapping) = self.mappings.get(account_no) {
            return AccountClass::Department(mapping);
        }
        if let Some(idx) = self
            .chart
            .expense_categories
            .iter()
            .position(|c| c.account_ranges.iter().any(|r| r.contains(account_no)))
        {
            return AccountClass::Expense(idx);
        }
        NonOperatingKind::ALL
            .into_iter()
            .find(|kind| {
                self.chart
                    .non_operating
                    .ranges(*kind)
                    .iter()
                    .any(|r| r.contains(account_no))
            })
            .map_or(AccountClass::Unmapped, AccountClass::NonOperating)
    }

    /// The underlying chart.
    #[must_use]
    pub fn chart(&self) -> &TenantChart {
        &self.chart
    }

    /// Exact mapping of an account, if any.
    #[must_use]
    pub fn mapping(&self, account_no: &str) -> Option<&AccountMapping> {
        self.mappings.get(account_no)
    }

    /// All department categories ordered by department.
    #[must_use]
    pub fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    /// Looks up a category by key.
    #[must_use]
    pub fn category(&self, key: &str) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Chart description of an account (empty when the chart does not list it).
    #[must_use]
    pub fn description(&self, account_no: &str) -> &str {
        self.descriptions.get(account_no).map_or("", String::as_str)
    }

    /// Chart accounts falling in the given expense category.
    #[must_use]
    pub fn expense_accounts(&self, category_idx: usize) -> &[String] {
        self.expense_accounts
            .get(category_idx)
            .map_or(&[], Vec::as_slice)
    }

    /// Chart accounts falling in a non-operating bucket.
    #[must_use]
    pub fn non_operating_accounts(&self, kind: NonOperatingKind) -> &[String] {
        self.non_operating_accounts
            .get(&kind)
            .map_or(&[], Vec::as_slice)
    }

    /// Chart accounts inside the statement span that nothing classifies.
    #[must_use]
    pub fn unmapped_accounts(&self) -> &[String] {
        &self.unmapped_accounts
    }
}

fn validate_ranges(chart: &TenantChart) -> Result<(), String> {
    // Every configured block tagged with the category or bucket owning it.
    let mut owned: Vec<(String, AccountRange)> = Vec::new();
    for category in &chart.expense_categories {
        for range in &category.account_ranges {
            owned.push((format!("expense category {}", category.name), *range));
        }
    }
    for kind in NonOperatingKind::ALL {
        for range in chart.non_operating.ranges(kind) {
            owned.push((kind.as_str().to_string(), *range));
        }
    }

    let inverted = owned
        .iter()
        .map(|(_, range)| range)
        .chain(&chart.statement_span)
        .find(|range| range.low > range.high);
    if let Some(range) = inverted {
        return Err(format!("range {range} is inverted"));
    }

    for (i, (owner_a, a)) in owned.iter().enumerate() {
        for (owner_b, b) in &owned[i + 1..] {
            if owner_a != owner_b && a.overlaps(b) {
                return Err(format!(
                    "range {a} of {owner_a} overlaps range {b} of {owner_b}"
                ));
            }
        }
    }
    Ok(())
}

fn validate_allocation(chart: &TenantChart) -> Result<(), String> {
    for (department, weight) in &chart.allocation.weights {
        if department.is_reserved() {
            return Err("G&A receives the unallocated remainder and cannot be weighted".into());
        }
        if weight.is_sign_negative() && !weight.is_zero() {
            return Err(format!("allocation weight for {department} is negative"));
        }
    }
    let total = chart.allocation.allocated_weight();
    if total > rust_decimal::Decimal::ONE {
        return Err(format!("allocation weights sum to {total}, above 1"));
    }
    Ok(())
}

fn validate_groupings(chart: &TenantChart) -> Result<(), String> {
    for grouping in &chart.groupings {
        if grouping.departments.iter().any(|d| d.is_reserved()) {
            return Err(format!("grouping {} includes G&A", grouping.name));
        }
    }
    if let Some(name) = &chart.absorption_grouping {
        if !chart.groupings.iter().any(|g| &g.name == name) {
            return Err(format!("absorption grouping {name} is not defined"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::types::{
        AllocationTable, DealershipInfo, DepartmentGrouping, ExpenseCategory, GlAccount,
        NonOperatingRanges,
    };
    use dealerbook_shared::TenantId;
    use rust_decimal_macros::dec;

    fn mapping(account: &str, department: Department, role: AccountRole, cat: &str) -> AccountMapping {
        AccountMapping {
            account_no: account.to_string(),
            department,
            role,
            category: cat.to_string(),
            category_label: String::new(),
        }
    }

    fn account(no: &str) -> GlAccount {
        GlAccount {
            account_no: no.to_string(),
            description: format!("Account {no}"),
        }
    }

    fn chart() -> TenantChart {
        TenantChart {
            tenant_id: TenantId::new(),
            dealership: DealershipInfo::default(),
            accounts: ["410001", "510001", "600100", "600200", "610050", "650000", "710000", "720000", "800000"]
                .into_iter()
                .map(account)
                .collect(),
            statement_span: vec![AccountRange::new(400_000, 799_999)],
            mappings: vec![
                mapping("410001", Department::NewEquipment, AccountRole::Revenue, "new_primary"),
                mapping("510001", Department::NewEquipment, AccountRole::Cost, "new_primary"),
                mapping("600200", Department::Parts, AccountRole::Cost, "parts_counter"),
            ],
            expense_categories: vec![
                ExpenseCategory {
                    name: "Salaries".into(),
                    account_ranges: vec![AccountRange::new(600_000, 609_999)],
                },
                ExpenseCategory {
                    name: "Rent".into(),
                    account_ranges: vec![AccountRange::new(610_000, 619_999)],
                },
            ],
            non_operating: NonOperatingRanges {
                other_income: vec![AccountRange::new(700_000, 709_999)],
                interest_expense: vec![AccountRange::new(710_000, 719_999)],
                ..NonOperatingRanges::default()
            },
            allocation: AllocationTable::from_weights([(Department::Parts, dec!(0.2))]),
            groupings: vec![DepartmentGrouping {
                name: "aftermarket".into(),
                departments: vec![Department::Service, Department::Parts],
            }],
            absorption_grouping: Some("aftermarket".into()),
        }
    }

    #[test]
    fn test_exact_mapping_takes_precedence_over_range() {
        let index = ChartIndex::build(chart()).unwrap();
        // 600200 sits in the Salaries range but is mapped to parts cost.
        assert!(matches!(
            index.classify("600200"),
            AccountClass::Department(m) if m.department == Department::Parts
        ));
        assert_eq!(index.classify("600100"), AccountClass::Expense(0));
        assert_eq!(index.expense_accounts(0), ["600100".to_string()]);
        assert_eq!(index.expense_accounts(1), ["610050".to_string()]);
    }

    #[test]
    fn test_classifies_non_operating_and_unmapped() {
        let index = ChartIndex::build(chart()).unwrap();
        assert_eq!(
            index.classify("710000"),
            AccountClass::NonOperating(NonOperatingKind::InterestExpense)
        );
        assert_eq!(index.classify("650000"), AccountClass::Unmapped);
        // 800000 is outside the statement span, so it is not reported as a gap.
        assert_eq!(
            index.unmapped_accounts(),
            ["650000".to_string(), "720000".to_string()]
        );
    }

    #[test]
    fn test_empty_statement_span_scans_whole_chart() {
        let mut chart = chart();
        chart.statement_span.clear();

        let index = ChartIndex::build(chart).unwrap();

        assert_eq!(
            index.unmapped_accounts(),
            ["650000".to_string(), "720000".to_string(), "800000".to_string()]
        );
    }

    #[test]
    fn test_categories_group_revenue_and_cost() {
        let index = ChartIndex::build(chart()).unwrap();
        let category = index.category("new_primary").unwrap();
        assert_eq!(category.revenue_accounts, ["410001"]);
        assert_eq!(category.cost_accounts, ["510001"]);
        assert_eq!(category.accounts(), ["410001", "510001"]);
        assert_eq!(category.label, "new_primary");
        assert_eq!(index.categories()[0].department, Department::NewEquipment);
        assert!(index.category("rental_short_term").is_none());
    }

    #[test]
    fn test_duplicate_mapping_rejected() {
        let mut chart = chart();
        chart.mappings.push(mapping(
            "410001",
            Department::Rental,
            AccountRole::Revenue,
            "rental",
        ));
        assert!(matches!(
            ChartIndex::build(chart),
            Err(ChartError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_category_spanning_departments_rejected() {
        let mut chart = chart();
        chart.mappings.push(mapping(
            "410002",
            Department::UsedEquipment,
            AccountRole::Revenue,
            "new_primary",
        ));
        assert!(ChartIndex::build(chart).is_err());
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let mut chart = chart();
        chart.expense_categories[1].account_ranges = vec![AccountRange::new(609_000, 619_999)];
        let err = ChartIndex::build(chart).unwrap_err();
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn test_expense_and_non_operating_overlap_rejected() {
        let mut chart = chart();
        chart.non_operating.financing_income = vec![AccountRange::new(615_000, 615_999)];
        assert!(ChartIndex::build(chart).is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut chart = chart();
        chart.statement_span = vec![AccountRange::new(799_999, 400_000)];
        assert!(ChartIndex::build(chart).is_err());
    }

    #[test]
    fn test_allocation_validation() {
        let mut over = chart();
        over.allocation = AllocationTable::from_weights([
            (Department::Parts, dec!(0.6)),
            (Department::Service, dec!(0.5)),
        ]);
        assert!(ChartIndex::build(over).is_err());

        let mut negative = chart();
        negative.allocation = AllocationTable::from_weights([(Department::Parts, dec!(-0.1))]);
        assert!(ChartIndex::build(negative).is_err());

        let mut reserved = chart();
        reserved.allocation =
            AllocationTable::from_weights([(Department::GeneralAdministrative, dec!(0.1))]);
        assert!(ChartIndex::build(reserved).is_err());

        let mut full = chart();
        full.allocation = AllocationTable::from_weights([
            (Department::Parts, dec!(0.5)),
            (Department::Service, dec!(0.5)),
        ]);
        assert!(ChartIndex::build(full).is_ok());
    }

    #[test]
    fn test_unknown_absorption_grouping_rejected() {
        let mut chart = chart();
        chart.absorption_grouping = Some("fixed_ops".into());
        assert!(ChartIndex::build(chart).is_err());
    }

    #[test]
    fn test_reserved_department_mapping_rejected() {
        let mut chart = chart();
        chart.mappings.push(mapping(
            "420000",
            Department::GeneralAdministrative,
            AccountRole::Revenue,
            "misc",
        ));
        assert!(ChartIndex::build(chart).is_err());
    }
}
