//! Database seeder for Dealerbook development and testing.
//!
//! Seeds one demo dealership: its chart of accounts, department mappings,
//! overhead categories, allocation weights, and three months of posted GL
//! activity with the first two months closed into monthly summaries.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use dealerbook_core::chart::{
    AccountMapping, AccountRange, AccountRole, AllocationTable, ChartStore, DealershipInfo,
    Department, DepartmentGrouping, ExpenseCategory, GlAccount, NonOperatingRanges, TenantChart,
};
use dealerbook_db::{LedgerRepository, NewGlTransaction, TenantChartRepository};
use dealerbook_shared::TenantId;

/// Demo tenant ID (consistent for all seeds)
const DEMO_TENANT_ID: Uuid = Uuid::from_u128(1);

/// Year of the seeded activity.
const YEAR: i32 = 2026;

/// `(account, description, department, role, category, label)` for every
/// mapped revenue and cost account.
#[rustfmt::skip]
const MAPPED_ACCOUNTS: &[(&str, &str, Department, AccountRole, &str, &str)] = &[
    ("410001", "New Lift Truck Sales", Department::NewEquipment, AccountRole::Revenue, "new_lift_truck", "New Lift Trucks"),
    ("510001", "New Lift Truck Cost", Department::NewEquipment, AccountRole::Cost, "new_lift_truck", "New Lift Trucks"),
    ("410002", "New Attachment Sales", Department::NewEquipment, AccountRole::Revenue, "new_attachments", "New Attachments"),
    ("510002", "New Attachment Cost", Department::NewEquipment, AccountRole::Cost, "new_attachments", "New Attachments"),
    ("420001", "Used Equipment Sales", Department::UsedEquipment, AccountRole::Revenue, "used_equipment", "Used Equipment"),
    ("520001", "Used Equipment Cost", Department::UsedEquipment, AccountRole::Cost, "used_equipment", "Used Equipment"),
    ("430001", "Short-Term Rental Revenue", Department::Rental, AccountRole::Revenue, "short_term_rental", "Short-Term Rental"),
    ("530001", "Rental Fleet Depreciation", Department::Rental, AccountRole::Cost, "short_term_rental", "Short-Term Rental"),
    ("440001", "Customer Labor Sales", Department::Service, AccountRole::Revenue, "customer_labor", "Customer Labor"),
    ("540001", "Customer Labor Cost", Department::Service, AccountRole::Cost, "customer_labor", "Customer Labor"),
    ("440002", "Warranty Labor Sales", Department::Service, AccountRole::Revenue, "warranty_labor", "Warranty Labor"),
    ("540002", "Warranty Labor Cost", Department::Service, AccountRole::Cost, "warranty_labor", "Warranty Labor"),
    ("450001", "Parts Counter Sales", Department::Parts, AccountRole::Revenue, "parts_counter", "Parts Counter"),
    ("550001", "Parts Counter Cost", Department::Parts, AccountRole::Cost, "parts_counter", "Parts Counter"),
    ("460001", "Freight Revenue", Department::Trucking, AccountRole::Revenue, "freight", "Freight"),
    ("560001", "Freight Cost", Department::Trucking, AccountRole::Cost, "freight", "Freight"),
];

/// `(account, description)` of accounts outside the department mapping.
const OTHER_ACCOUNTS: &[(&str, &str)] = &[
    ("480100", "Cash Discounts Allowed"),
    ("600100", "Salaries - Sales"),
    ("600200", "Salaries - Service"),
    ("610100", "Building Rent"),
    ("620100", "General Insurance"),
    ("630000", "Suspense"),
    ("700100", "Gain on Asset Disposal"),
    ("710100", "Floor Plan Interest"),
    ("720100", "Finance Reserve Income"),
];

/// January activity per account in cents, credits negative.
const BASE_ACTIVITY: &[(&str, i64)] = &[
    ("410001", -12_000_000),
    ("510001", 9_800_000),
    ("410002", -800_000),
    ("510002", 550_000),
    ("420001", -4_500_000),
    ("520001", 3_900_000),
    ("430001", -3_000_000),
    ("530001", 1_200_000),
    ("440001", -4_000_000),
    ("540001", 1_400_000),
    ("440002", -600_000),
    ("540002", 250_000),
    ("450001", -5_500_000),
    ("550001", 3_600_000),
    ("460001", -400_000),
    ("560001", 310_000),
    ("480100", 120_000),
    ("600100", 2_100_000),
    ("600200", 1_400_000),
    ("610100", 900_000),
    ("620100", 300_000),
    ("630000", 75_025),
    ("700100", -250_000),
    ("710100", -180_000),
    ("720100", -90_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = dealerbook_db::connect(&database_url).await?;

    let tenant_id = TenantId::from_uuid(DEMO_TENANT_ID);
    let charts = TenantChartRepository::new(db.clone());
    let ledger = LedgerRepository::new(db);

    if charts.load_chart(tenant_id).await?.is_some() {
        println!("  Demo dealership already exists, skipping...");
        return Ok(());
    }

    println!("Seeding demo dealership chart...");
    charts.save_chart(&demo_chart(tenant_id)).await?;

    for month in 1..=3 {
        println!("Seeding GL activity for {YEAR}-{month:02}...");
        let lines = month_activity(month)?;
        ledger.insert_transactions(tenant_id, &lines).await?;
    }

    for month in 1..=2 {
        let written = ledger.close_month(tenant_id, YEAR, month).await?;
        println!("Closed {YEAR}-{month:02} ({written} account summaries)");
    }

    println!("Seeding complete! Demo tenant: {tenant_id}");
    Ok(())
}

fn demo_chart(tenant_id: TenantId) -> TenantChart {
    let accounts = MAPPED_ACCOUNTS
        .iter()
        .map(|(account_no, description, ..)| (*account_no, *description))
        .chain(OTHER_ACCOUNTS.iter().copied())
        .map(|(account_no, description)| GlAccount {
            account_no: account_no.to_string(),
            description: description.to_string(),
        })
        .collect();

    let mappings = MAPPED_ACCOUNTS
        .iter()
        .map(
            |(account_no, _, department, role, category, label)| AccountMapping {
                account_no: (*account_no).to_string(),
                department: *department,
                role: *role,
                category: (*category).to_string(),
                category_label: (*label).to_string(),
            },
        )
        .collect();

    let expense = |name: &str, low, high| ExpenseCategory {
        name: name.to_string(),
        account_ranges: vec![AccountRange::new(low, high)],
    };

    TenantChart {
        tenant_id,
        dealership: DealershipInfo {
            name: "Harbor Lift & Equipment".to_string(),
            code: "HLE".to_string(),
        },
        accounts,
        statement_span: vec![AccountRange::new(400_000, 799_999)],
        mappings,
        expense_categories: vec![
            expense("Salaries & Wages", 600_000, 609_999),
            expense("Rent", 610_000, 619_999),
            expense("Insurance", 620_000, 629_999),
        ],
        non_operating: NonOperatingRanges {
            revenue_adjustments: vec![AccountRange::new(480_000, 489_999)],
            other_income: vec![AccountRange::new(700_000, 709_999)],
            interest_expense: vec![AccountRange::new(710_000, 719_999)],
            financing_income: vec![AccountRange::new(720_000, 729_999)],
        },
        allocation: AllocationTable::from_weights([
            (Department::NewEquipment, Decimal::new(15, 2)),
            (Department::Rental, Decimal::new(10, 2)),
            (Department::Service, Decimal::new(30, 2)),
            (Department::Parts, Decimal::new(20, 2)),
        ]),
        groupings: vec![
            DepartmentGrouping {
                name: "aftermarket".to_string(),
                departments: vec![Department::Service, Department::Parts],
            },
            DepartmentGrouping {
                name: "absorption".to_string(),
                departments: vec![Department::Rental, Department::Service, Department::Parts],
            },
        ],
        absorption_grouping: Some("absorption".to_string()),
    }
}

/// One month of posted activity, split over two posting dates, plus one
/// unposted draft that must never reach a statement.
fn month_activity(month: u32) -> anyhow::Result<Vec<NewGlTransaction>> {
    let early = NaiveDate::from_ymd_opt(YEAR, month, 5).context("invalid seed date")?;
    let late = NaiveDate::from_ymd_opt(YEAR, month, 20).context("invalid seed date")?;
    // Each month runs 5% above the previous one.
    let growth = Decimal::new(100 + 5 * i64::from(month - 1), 2);

    let mut lines = Vec::with_capacity(BASE_ACTIVITY.len() * 2 + 1);
    for (account_no, cents) in BASE_ACTIVITY {
        let total = (Decimal::new(*cents, 2) * growth).round_dp(2);
        let first = (total / Decimal::TWO).round_dp(2);
        for (date, amount) in [(early, first), (late, total - first)] {
            lines.push(NewGlTransaction {
                account_no: (*account_no).to_string(),
                transaction_date: date,
                amount,
                posted: true,
                memo: None,
            });
        }
    }
    lines.push(NewGlTransaction {
        account_no: "410001".to_string(),
        transaction_date: late,
        amount: Decimal::new(-7_777_700, 2),
        posted: false,
        memo: Some("Draft invoice awaiting approval".to_string()),
    });
    Ok(lines)
}
