//! Tenant chart repository.
//!
//! Reads and replaces the statement configuration of one dealership. The
//! chart is spread over normalized tables and reassembled into a
//! [`TenantChart`] here; validation happens when the registry indexes it.

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use dealerbook_core::chart::{
    AccountMapping, AccountRange, AccountRole, AllocationTable, ChartError, ChartStore,
    DealershipInfo, Department, DepartmentGrouping, ExpenseCategory, GlAccount,
    NonOperatingKind, NonOperatingRanges, TenantChart,
};
use dealerbook_shared::{ExpenseCategoryId, TenantId};

use crate::entities::{
    account_mappings, account_ranges, allocation_weights, department_groupings,
    expense_categories, expense_category_ranges, gl_accounts, tenants,
};

/// `account_ranges.purpose` value for the unmapped-activity scan.
const STATEMENT_SPAN: &str = "statement_span";

/// Tenant chart repository implementation.
#[derive(Debug, Clone)]
pub struct TenantChartRepository {
    db: DatabaseConnection,
}

impl TenantChartRepository {
    /// Create a new tenant chart repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Replaces a tenant's whole configuration in one transaction.
    ///
    /// The tenant row is created on first save. Accounts are upserted; an
    /// account left out of `chart` is removed only if no ledger row uses it.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::Store`] if any write fails, including removing an
    /// account that still has ledger activity; nothing is changed then.
    pub async fn save_chart(&self, chart: &TenantChart) -> Result<(), ChartError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        write_chart(&txn, chart).await.map_err(store_error)?;
        txn.commit().await.map_err(store_error)?;

        info!(
            tenant_id = %chart.tenant_id,
            mappings = chart.mappings.len(),
            expense_categories = chart.expense_categories.len(),
            "Saved tenant chart"
        );
        Ok(())
    }
}

impl ChartStore for TenantChartRepository {
    async fn load_chart(&self, tenant_id: TenantId) -> Result<Option<TenantChart>, ChartError> {
        let tenant_uuid = tenant_id.into_inner();

        let Some(tenant) = tenants::Entity::find_by_id(tenant_uuid)
            .one(&self.db)
            .await
            .map_err(store_error)?
        else {
            debug!(%tenant_id, "Tenant not found");
            return Ok(None);
        };

        let accounts = gl_accounts::Entity::find()
            .filter(gl_accounts::Column::TenantId.eq(tenant_uuid))
            .order_by_asc(gl_accounts::Column::AccountNo)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|row| GlAccount {
                account_no: row.account_no,
                description: row.description,
            })
            .collect();

        let mappings = account_mappings::Entity::find()
            .filter(account_mappings::Column::TenantId.eq(tenant_uuid))
            .order_by_asc(account_mappings::Column::AccountNo)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|row| to_mapping(tenant_id, row))
            .collect::<Result<Vec<_>, _>>()?;

        let range_rows = account_ranges::Entity::find()
            .filter(account_ranges::Column::TenantId.eq(tenant_uuid))
            .order_by_asc(account_ranges::Column::RangeLow)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        let (statement_span, non_operating) = split_ranges(tenant_id, range_rows)?;

        let mut category_rows = expense_categories::Entity::find()
            .filter(expense_categories::Column::TenantId.eq(tenant_uuid))
            .find_with_related(expense_category_ranges::Entity)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        category_rows.sort_by(|(a, _), (b, _)| {
            a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name))
        });
        let expense_categories = category_rows
            .into_iter()
            .map(|(category, ranges)| to_expense_category(tenant_id, category, ranges))
            .collect::<Result<Vec<_>, _>>()?;

        let allocation = allocation_weights::Entity::find()
            .filter(allocation_weights::Column::TenantId.eq(tenant_uuid))
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|row| Ok((parse_department(tenant_id, &row.department)?, row.weight)))
            .collect::<Result<Vec<_>, ChartError>>()
            .map(AllocationTable::from_weights)?;

        let grouping_rows = department_groupings::Entity::find()
            .filter(department_groupings::Column::TenantId.eq(tenant_uuid))
            .order_by_asc(department_groupings::Column::SortOrder)
            .order_by_asc(department_groupings::Column::Name)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        let groupings = group_departments(tenant_id, grouping_rows)?;

        debug!(
            %tenant_id,
            mappings = mappings.len(),
            expense_categories = expense_categories.len(),
            "Loaded tenant chart"
        );

        Ok(Some(TenantChart {
            tenant_id,
            dealership: DealershipInfo {
                name: tenant.name,
                code: tenant.code,
            },
            accounts,
            statement_span,
            mappings,
            expense_categories,
            non_operating,
            allocation,
            groupings,
            absorption_grouping: tenant.absorption_grouping,
        }))
    }
}

async fn write_chart(txn: &DatabaseTransaction, chart: &TenantChart) -> Result<(), DbErr> {
    let tenant_uuid = chart.tenant_id.into_inner();
    let now = Utc::now();

    tenants::Entity::insert(tenants::ActiveModel {
        id: Set(tenant_uuid),
        name: Set(chart.dealership.name.clone()),
        code: Set(chart.dealership.code.clone()),
        absorption_grouping: Set(chart.absorption_grouping.clone()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
    .on_conflict(
        OnConflict::column(tenants::Column::Id)
            .update_columns([
                tenants::Column::Name,
                tenants::Column::Code,
                tenants::Column::AbsorptionGrouping,
            ])
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;

    // Ledger rows reference gl_accounts, so dropping an account that still
    // carries activity fails the whole save.
    let account_nos: Vec<&str> = chart.accounts.iter().map(|a| a.account_no.as_str()).collect();
    gl_accounts::Entity::delete_many()
        .filter(gl_accounts::Column::TenantId.eq(tenant_uuid))
        .filter(gl_accounts::Column::AccountNo.is_not_in(account_nos))
        .exec(txn)
        .await?;

    // Expense category ranges go with their categories (ON DELETE CASCADE).
    account_mappings::Entity::delete_many()
        .filter(account_mappings::Column::TenantId.eq(tenant_uuid))
        .exec(txn)
        .await?;
    account_ranges::Entity::delete_many()
        .filter(account_ranges::Column::TenantId.eq(tenant_uuid))
        .exec(txn)
        .await?;
    expense_categories::Entity::delete_many()
        .filter(expense_categories::Column::TenantId.eq(tenant_uuid))
        .exec(txn)
        .await?;
    allocation_weights::Entity::delete_many()
        .filter(allocation_weights::Column::TenantId.eq(tenant_uuid))
        .exec(txn)
        .await?;
    department_groupings::Entity::delete_many()
        .filter(department_groupings::Column::TenantId.eq(tenant_uuid))
        .exec(txn)
        .await?;

    if !chart.accounts.is_empty() {
        gl_accounts::Entity::insert_many(chart.accounts.iter().map(|account| {
            gl_accounts::ActiveModel {
                id: Set(Uuid::now_v7()),
                tenant_id: Set(tenant_uuid),
                account_no: Set(account.account_no.clone()),
                description: Set(account.description.clone()),
            }
        }))
        .on_conflict(
            OnConflict::columns([gl_accounts::Column::TenantId, gl_accounts::Column::AccountNo])
                .update_column(gl_accounts::Column::Description)
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;
    }

    if !chart.mappings.is_empty() {
        account_mappings::Entity::insert_many(chart.mappings.iter().map(|mapping| {
            account_mappings::ActiveModel {
                id: Set(Uuid::now_v7()),
                tenant_id: Set(tenant_uuid),
                account_no: Set(mapping.account_no.clone()),
                department: Set(mapping.department.as_str().to_string()),
                role: Set(role_str(mapping).to_string()),
                category: Set(mapping.category.clone()),
                category_label: Set(mapping.category_label.clone()),
            }
        }))
        .exec_without_returning(txn)
        .await?;
    }

    let ranges = range_rows(chart)
        .map(|(purpose, range)| {
            Ok(account_ranges::ActiveModel {
                id: Set(Uuid::now_v7()),
                tenant_id: Set(tenant_uuid),
                purpose: Set(purpose.to_string()),
                range_low: Set(to_column(range.low)?),
                range_high: Set(to_column(range.high)?),
            })
        })
        .collect::<Result<Vec<_>, DbErr>>()?;
    if !ranges.is_empty() {
        account_ranges::Entity::insert_many(ranges)
            .exec_without_returning(txn)
            .await?;
    }

    for (position, category) in chart.expense_categories.iter().enumerate() {
        let category_id = ExpenseCategoryId::new().into_inner();
        expense_categories::Entity::insert(expense_categories::ActiveModel {
            id: Set(category_id),
            tenant_id: Set(tenant_uuid),
            name: Set(category.name.clone()),
            sort_order: Set(to_sort_order(position)?),
        })
        .exec_without_returning(txn)
        .await?;

        let ranges = category
            .account_ranges
            .iter()
            .map(|range| {
                Ok(expense_category_ranges::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    expense_category_id: Set(category_id),
                    range_low: Set(to_column(range.low)?),
                    range_high: Set(to_column(range.high)?),
                })
            })
            .collect::<Result<Vec<_>, DbErr>>()?;
        if !ranges.is_empty() {
            expense_category_ranges::Entity::insert_many(ranges)
                .exec_without_returning(txn)
                .await?;
        }
    }

    if !chart.allocation.weights.is_empty() {
        allocation_weights::Entity::insert_many(chart.allocation.weights.iter().map(
            |(department, weight)| allocation_weights::ActiveModel {
                id: Set(Uuid::now_v7()),
                tenant_id: Set(tenant_uuid),
                department: Set(department.as_str().to_string()),
                weight: Set(*weight),
            },
        ))
        .exec_without_returning(txn)
        .await?;
    }

    let mut members = Vec::new();
    for (position, grouping) in chart.groupings.iter().enumerate() {
        let sort_order = to_sort_order(position)?;
        members.extend(grouping.departments.iter().map(|department| {
            department_groupings::ActiveModel {
                id: Set(Uuid::now_v7()),
                tenant_id: Set(tenant_uuid),
                name: Set(grouping.name.clone()),
                department: Set(department.as_str().to_string()),
                sort_order: Set(sort_order),
            }
        }));
    }
    if !members.is_empty() {
        department_groupings::Entity::insert_many(members)
            .exec_without_returning(txn)
            .await?;
    }

    Ok(())
}

// ============================================================================
// Conversions
// ============================================================================

fn store_error(err: DbErr) -> ChartError {
    ChartError::store(err.to_string())
}

fn parse_department(tenant_id: TenantId, value: &str) -> Result<Department, ChartError> {
    value
        .parse()
        .map_err(|reason: String| ChartError::invalid(tenant_id, reason))
}

fn role_str(mapping: &AccountMapping) -> &'static str {
    match mapping.role {
        AccountRole::Revenue => "revenue",
        AccountRole::Cost => "cost",
    }
}

fn to_mapping(
    tenant_id: TenantId,
    row: account_mappings::Model,
) -> Result<AccountMapping, ChartError> {
    Ok(AccountMapping {
        department: parse_department(tenant_id, &row.department)?,
        role: row
            .role
            .parse()
            .map_err(|reason: String| ChartError::invalid(tenant_id, reason))?,
        account_no: row.account_no,
        category: row.category,
        category_label: row.category_label,
    })
}

fn to_range(tenant_id: TenantId, low: i64, high: i64) -> Result<AccountRange, ChartError> {
    let bound = |value: i64| {
        u64::try_from(value).map_err(|_| {
            ChartError::invalid(tenant_id, format!("negative account number {value} in range"))
        })
    };
    Ok(AccountRange::new(bound(low)?, bound(high)?))
}

fn to_column(value: u64) -> Result<i64, DbErr> {
    i64::try_from(value).map_err(|_| DbErr::Custom(format!("account number {value} out of range")))
}

fn to_sort_order(position: usize) -> Result<i32, DbErr> {
    i32::try_from(position).map_err(|_| DbErr::Custom(format!("too many entries ({position})")))
}

fn to_expense_category(
    tenant_id: TenantId,
    category: expense_categories::Model,
    mut ranges: Vec<expense_category_ranges::Model>,
) -> Result<ExpenseCategory, ChartError> {
    ranges.sort_by_key(|row| row.range_low);
    Ok(ExpenseCategory {
        name: category.name,
        account_ranges: ranges
            .into_iter()
            .map(|row| to_range(tenant_id, row.range_low, row.range_high))
            .collect::<Result<_, _>>()?,
    })
}

/// Splits `account_ranges` rows into the statement span and the
/// non-operating blocks.
fn split_ranges(
    tenant_id: TenantId,
    rows: Vec<account_ranges::Model>,
) -> Result<(Vec<AccountRange>, NonOperatingRanges), ChartError> {
    let mut span = Vec::new();
    let mut non_operating = NonOperatingRanges::default();
    for row in rows {
        let range = to_range(tenant_id, row.range_low, row.range_high)?;
        if row.purpose == STATEMENT_SPAN {
            span.push(range);
        } else {
            let kind: NonOperatingKind = row
                .purpose
                .parse()
                .map_err(|reason: String| ChartError::invalid(tenant_id, reason))?;
            non_operating.ranges_mut(kind).push(range);
        }
    }
    Ok((span, non_operating))
}

/// Every configured range with its `purpose` column value.
fn range_rows(chart: &TenantChart) -> impl Iterator<Item = (&'static str, &AccountRange)> {
    chart
        .statement_span
        .iter()
        .map(|range| (STATEMENT_SPAN, range))
        .chain(NonOperatingKind::ALL.into_iter().flat_map(move |kind| {
            chart
                .non_operating
                .ranges(kind)
                .iter()
                .map(move |range| (kind.as_str(), range))
        }))
}

/// Folds one-row-per-member grouping rows back into groupings, keeping the
/// order rows arrive in.
fn group_departments(
    tenant_id: TenantId,
    rows: Vec<department_groupings::Model>,
) -> Result<Vec<DepartmentGrouping>, ChartError> {
    let mut order: Vec<String> = Vec::new();
    let mut members: BTreeMap<String, Vec<Department>> = BTreeMap::new();
    for row in rows {
        let department = parse_department(tenant_id, &row.department)?;
        if !members.contains_key(&row.name) {
            order.push(row.name.clone());
        }
        members.entry(row.name).or_default().push(department);
    }
    Ok(order
        .into_iter()
        .map(|name| {
            let mut departments = members.remove(&name).unwrap_or_default();
            departments.sort();
            DepartmentGrouping { name, departments }
        })
        .collect())
}
