//! Ledger repository.
//!
//! Both read shapes are single parameterized statements; the account list is
//! bound as a Postgres array and never interpolated into SQL text.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, FromQueryResult, Set,
    Statement, Value,
};
use tracing::debug;

use dealerbook_core::aggregation::{LedgerError, LedgerQuery};
use dealerbook_core::period::last_day_of_month;
use dealerbook_shared::{GlTransactionId, TenantId};

use crate::entities::gl_transactions;

const ACCOUNT_SUMS_SQL: &str = r"
SELECT account_no, SUM(amount) AS total
FROM gl_transactions
WHERE tenant_id = $1
  AND account_no = ANY($2)
  AND transaction_date BETWEEN $3 AND $4
  AND (posted OR NOT $5)
GROUP BY account_no
";

const MONTHLY_SUMS_SQL: &str = r"
SELECT account_no, SUM(amount) AS total
FROM gl_monthly_summaries
WHERE tenant_id = $1
  AND account_no = ANY($2)
  AND year = $3
  AND month = $4
GROUP BY account_no
";

const CLOSE_MONTH_SQL: &str = r"
INSERT INTO gl_monthly_summaries (id, tenant_id, account_no, year, month, amount)
SELECT gen_random_uuid(), $1, account_no, $2, $3, SUM(amount)
FROM gl_transactions
WHERE tenant_id = $1
  AND posted
  AND transaction_date BETWEEN $4 AND $5
GROUP BY account_no
ON CONFLICT (tenant_id, account_no, year, month)
DO UPDATE SET amount = EXCLUDED.amount, closed_at = now()
";

#[derive(Debug, FromQueryResult)]
struct AccountTotalRow {
    account_no: String,
    total: Decimal,
}

/// A GL line to record.
#[derive(Debug, Clone)]
pub struct NewGlTransaction {
    /// GL account number.
    pub account_no: String,
    /// Posting date.
    pub transaction_date: NaiveDate,
    /// Signed amount, credits negative.
    pub amount: Decimal,
    /// Whether the entry is posted.
    pub posted: bool,
    /// Free-text memo.
    pub memo: Option<String>,
}

/// Ledger repository backed by Postgres.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Create a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn sums(&self, sql: &str, values: Vec<Value>) -> Result<BTreeMap<String, Decimal>, DbErr> {
        let rows = AccountTotalRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            values,
        ))
        .all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.account_no, row.total))
            .collect())
    }

    /// Records GL lines for a tenant and returns their ids in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_transactions(
        &self,
        tenant_id: TenantId,
        lines: &[NewGlTransaction],
    ) -> Result<Vec<GlTransactionId>, DbErr> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let ids: Vec<GlTransactionId> = lines.iter().map(|_| GlTransactionId::new()).collect();
        let models = lines.iter().zip(&ids).map(|(line, id)| gl_transactions::ActiveModel {
            id: Set(id.into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            account_no: Set(line.account_no.clone()),
            transaction_date: Set(line.transaction_date),
            amount: Set(line.amount),
            posted: Set(line.posted),
            memo: Set(line.memo.clone()),
            created_at: Set(now.into()),
        });

        gl_transactions::Entity::insert_many(models)
            .exec_without_returning(&self.db)
            .await?;

        debug!(%tenant_id, count = ids.len(), "Recorded GL transactions");
        Ok(ids)
    }

    /// Rebuilds a month's summaries from its posted transactions.
    ///
    /// Returns the number of account summaries written.
    ///
    /// # Errors
    ///
    /// Returns an error if the month is invalid or the statement fails.
    pub async fn close_month(&self, tenant_id: TenantId, year: i32, month: u32) -> Result<u64, DbErr> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| DbErr::Custom(format!("invalid month {year}-{month:02}")))?;
        let last = last_day_of_month(year, month)
            .ok_or_else(|| DbErr::Custom(format!("invalid month {year}-{month:02}")))?;
        let month_no = i32::try_from(month)
            .map_err(|_| DbErr::Custom(format!("invalid month {month}")))?;

        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                CLOSE_MONTH_SQL,
                [
                    tenant_id.into_inner().into(),
                    year.into(),
                    month_no.into(),
                    first.into(),
                    last.into(),
                ],
            ))
            .await?;

        debug!(%tenant_id, year, month, rows = result.rows_affected(), "Closed month");
        Ok(result.rows_affected())
    }
}

impl LedgerQuery for LedgerRepository {
    async fn query_account_sums(
        &self,
        tenant_id: TenantId,
        accounts: &[String],
        start: NaiveDate,
        end: NaiveDate,
        posted_only: bool,
    ) -> Result<BTreeMap<String, Decimal>, LedgerError> {
        self.sums(
            ACCOUNT_SUMS_SQL,
            vec![
                tenant_id.into_inner().into(),
                accounts.to_vec().into(),
                start.into(),
                end.into(),
                posted_only.into(),
            ],
        )
        .await
        .map_err(|e| LedgerError::unavailable(e.to_string()))
    }

    async fn query_monthly_sums(
        &self,
        tenant_id: TenantId,
        accounts: &[String],
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<String, Decimal>, LedgerError> {
        let month = i32::try_from(month)
            .map_err(|_| LedgerError::unavailable(format!("invalid month {month}")))?;

        self.sums(
            MONTHLY_SUMS_SQL,
            vec![
                tenant_id.into_inner().into(),
                accounts.to_vec().into(),
                year.into(),
                month.into(),
            ],
        )
        .await
        .map_err(|e| LedgerError::unavailable(e.to_string()))
    }
}
