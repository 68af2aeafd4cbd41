//! In-memory ledger and chart store used by the engine's tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use dealerbook_shared::TenantId;

use crate::aggregation::{LedgerError, LedgerQuery};
use crate::chart::{
    AccountMapping, AccountRange, AccountRole, AllocationTable, ChartError, ChartStore,
    DealershipInfo, Department, DepartmentGrouping, ExpenseCategory, GlAccount,
    NonOperatingRanges, TenantChart,
};

#[derive(Debug, Clone)]
struct Row {
    account_no: String,
    date: NaiveDate,
    amount: Decimal,
    posted: bool,
}

/// Ledger double that answers from in-memory rows and records its traffic.
#[derive(Default)]
pub struct InMemoryLedger {
    rows: Vec<Row>,
    monthly: BTreeMap<(String, i32, u32), Decimal>,
    delay: Option<Duration>,
    fail: bool,
    detail_queries: AtomicUsize,
    monthly_queries: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_accounts: Mutex<Vec<String>>,
}

impl InMemoryLedger {
    pub fn with_transaction(
        mut self,
        account_no: &str,
        date: NaiveDate,
        amount: Decimal,
        posted: bool,
    ) -> Self {
        self.rows.push(Row {
            account_no: account_no.to_string(),
            date,
            amount,
            posted,
        });
        self
    }

    pub fn with_monthly(mut self, account_no: &str, year: i32, month: u32, amount: Decimal) -> Self {
        *self
            .monthly
            .entry((account_no.to_string(), year, month))
            .or_default() += amount;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn detail_query_count(&self) -> usize {
        self.detail_queries.load(Ordering::SeqCst)
    }

    pub fn monthly_query_count(&self) -> usize {
        self.monthly_queries.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.detail_query_count() + self.monthly_query_count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_account_list(&self) -> Vec<String> {
        self.last_accounts.lock().unwrap().clone()
    }

    async fn enter(&self, accounts: &[String]) -> Result<(), LedgerError> {
        *self.last_accounts.lock().unwrap() = accounts.to_vec();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail {
            return Err(LedgerError::unavailable("connection refused"));
        }
        Ok(())
    }
}

impl LedgerQuery for InMemoryLedger {
    async fn query_account_sums(
        &self,
        _tenant_id: TenantId,
        accounts: &[String],
        start: NaiveDate,
        end: NaiveDate,
        posted_only: bool,
    ) -> Result<BTreeMap<String, Decimal>, LedgerError> {
        self.detail_queries.fetch_add(1, Ordering::SeqCst);
        self.enter(accounts).await?;

        let mut sums = BTreeMap::new();
        for row in &self.rows {
            if accounts.contains(&row.account_no)
                && row.date >= start
                && row.date <= end
                && (row.posted || !posted_only)
            {
                *sums.entry(row.account_no.clone()).or_insert(Decimal::ZERO) += row.amount;
            }
        }
        Ok(sums)
    }

    async fn query_monthly_sums(
        &self,
        _tenant_id: TenantId,
        accounts: &[String],
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<String, Decimal>, LedgerError> {
        self.monthly_queries.fetch_add(1, Ordering::SeqCst);
        self.enter(accounts).await?;

        Ok(self
            .monthly
            .iter()
            .filter(|((account, y, m), _)| *y == year && *m == month && accounts.contains(account))
            .map(|((account, _, _), amount)| (account.clone(), *amount))
            .collect())
    }
}

/// Chart store double.
#[derive(Default)]
pub struct InMemoryChartStore {
    charts: HashMap<TenantId, TenantChart>,
}

impl InMemoryChartStore {
    pub fn with(chart: TenantChart) -> Self {
        let mut charts = HashMap::new();
        charts.insert(chart.tenant_id, chart);
        Self { charts }
    }
}

impl ChartStore for InMemoryChartStore {
    async fn load_chart(&self, tenant_id: TenantId) -> Result<Option<TenantChart>, ChartError> {
        Ok(self.charts.get(&tenant_id).cloned())
    }
}

fn mapping(account: &str, department: Department, role: AccountRole, category: &str) -> AccountMapping {
    AccountMapping {
        account_no: account.to_string(),
        department,
        role,
        category: category.to_string(),
        category_label: category.replace('_', " "),
    }
}

/// A small lift-truck dealership chart.
///
/// - new_lift_truck_primary: 410001 / 510001
/// - new_lift_truck_allied: 410002 / 510002
/// - used_equipment: 420001 / 520001
/// - rental_short_term: 430001 / 530001
/// - service_customer_labor: 440001 / 540001
/// - service_warranty_labor: 440002 / 540002
/// - parts_counter: 450001 / 550001
/// - trucking: 460001 / 560001
/// - overhead: salaries 600000-609999, rent 610000-619999, insurance 620000-629999
/// - revenue adjustment 480000-489999, other income 700000-709999,
///   interest 710000-719999, financing 720000-729999
/// - 630000 sits inside the statement span but belongs to nothing
pub fn sample_chart(tenant_id: TenantId) -> TenantChart {
    let mappings = vec![
        mapping("410001", Department::NewEquipment, AccountRole::Revenue, "new_lift_truck_primary"),
        mapping("510001", Department::NewEquipment, AccountRole::Cost, "new_lift_truck_primary"),
        mapping("410002", Department::NewEquipment, AccountRole::Revenue, "new_lift_truck_allied"),
        mapping("510002", Department::NewEquipment, AccountRole::Cost, "new_lift_truck_allied"),
        mapping("420001", Department::UsedEquipment, AccountRole::Revenue, "used_equipment"),
        mapping("520001", Department::UsedEquipment, AccountRole::Cost, "used_equipment"),
        mapping("430001", Department::Rental, AccountRole::Revenue, "rental_short_term"),
        mapping("530001", Department::Rental, AccountRole::Cost, "rental_short_term"),
        mapping("440001", Department::Service, AccountRole::Revenue, "service_customer_labor"),
        mapping("540001", Department::Service, AccountRole::Cost, "service_customer_labor"),
        mapping("440002", Department::Service, AccountRole::Revenue, "service_warranty_labor"),
        mapping("540002", Department::Service, AccountRole::Cost, "service_warranty_labor"),
        mapping("450001", Department::Parts, AccountRole::Revenue, "parts_counter"),
        mapping("550001", Department::Parts, AccountRole::Cost, "parts_counter"),
        mapping("460001", Department::Trucking, AccountRole::Revenue, "trucking"),
        mapping("560001", Department::Trucking, AccountRole::Cost, "trucking"),
    ];

    let mut accounts: Vec<GlAccount> = mappings
        .iter()
        .map(|m| GlAccount {
            account_no: m.account_no.clone(),
            description: format!("{} {:?}", m.category_label, m.role),
        })
        .collect();
    for (no, description) in [
        ("600100", "Salaries - Office"),
        ("600200", "Salaries - Management"),
        ("610100", "Building Rent"),
        ("620100", "Property Insurance"),
        ("630000", "Suspense"),
        ("480100", "Cash Discounts"),
        ("700100", "Miscellaneous Income"),
        ("710100", "Floor Plan Interest"),
        ("720100", "Finance Reserve Income"),
    ] {
        accounts.push(GlAccount {
            account_no: no.to_string(),
            description: description.to_string(),
        });
    }

    TenantChart {
        tenant_id,
        dealership: DealershipInfo {
            name: "Harbor Lift & Equipment".into(),
            code: "HLE".into(),
        },
        accounts,
        statement_span: vec![AccountRange::new(400_000, 799_999)],
        mappings,
        expense_categories: vec![
            ExpenseCategory {
                name: "Salaries & Wages".into(),
                account_ranges: vec![AccountRange::new(600_000, 609_999)],
            },
            ExpenseCategory {
                name: "Rent".into(),
                account_ranges: vec![AccountRange::new(610_000, 619_999)],
            },
            ExpenseCategory {
                name: "Insurance".into(),
                account_ranges: vec![AccountRange::new(620_000, 629_999)],
            },
        ],
        non_operating: NonOperatingRanges {
            revenue_adjustments: vec![AccountRange::new(480_000, 489_999)],
            other_income: vec![AccountRange::new(700_000, 709_999)],
            interest_expense: vec![AccountRange::new(710_000, 719_999)],
            financing_income: vec![AccountRange::new(720_000, 729_999)],
        },
        allocation: AllocationTable::from_weights([
            (Department::NewEquipment, dec!(0.15)),
            (Department::Rental, dec!(0.10)),
            (Department::Service, dec!(0.30)),
            (Department::Parts, dec!(0.20)),
        ]),
        groupings: vec![
            DepartmentGrouping {
                name: "aftermarket".into(),
                departments: vec![Department::Service, Department::Parts],
            },
            DepartmentGrouping {
                name: "absorption".into(),
                departments: vec![Department::Service, Department::Parts, Department::Rental],
            },
        ],
        absorption_grouping: Some("absorption".into()),
    }
}

/// Posted January 2026 activity for [`sample_chart`], as transaction rows
/// and the matching closed monthly summary.
pub fn sample_ledger() -> InMemoryLedger {
    let jan = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap_or_default();
    let activity: [(&str, Decimal); 24] = [
        ("410001", dec!(-120000.00)),
        ("510001", dec!(98000.00)),
        ("410002", dec!(-8000.00)),
        ("510002", dec!(5500.00)),
        ("420001", dec!(-45000.00)),
        ("520001", dec!(39000.00)),
        ("430001", dec!(-30000.00)),
        ("530001", dec!(12000.00)),
        ("440001", dec!(-40000.00)),
        ("540001", dec!(14000.00)),
        ("440002", dec!(-6000.00)),
        ("540002", dec!(2500.00)),
        ("450001", dec!(-55000.00)),
        ("550001", dec!(36000.00)),
        ("460001", dec!(-4000.00)),
        ("560001", dec!(3100.00)),
        ("600100", dec!(21000.00)),
        ("600200", dec!(14000.00)),
        ("610100", dec!(9000.00)),
        ("620100", dec!(3000.00)),
        ("630000", dec!(750.25)),
        ("480100", dec!(1200.00)),
        ("700100", dec!(-2500.00)),
        ("710100", dec!(-1800.00)),
    ];

    let mut ledger = InMemoryLedger::default();
    for (i, (account, amount)) in activity.into_iter().enumerate() {
        let day = u32::try_from(i % 28).unwrap_or(0) + 1;
        ledger = ledger
            .with_transaction(account, jan(day), amount, true)
            .with_monthly(account, 2026, 1, amount);
    }
    ledger
        .with_transaction("720100", jan(30), dec!(-900.00), true)
        .with_monthly("720100", 2026, 1, dec!(-900.00))
        // Drafts never reach a statement.
        .with_transaction("410001", jan(31), dec!(-77777.00), false)
}
