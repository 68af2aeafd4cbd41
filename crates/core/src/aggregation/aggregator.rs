//! Source-agnostic per-account summation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::debug;

use dealerbook_shared::TenantId;

use super::error::LedgerError;
use super::query::LedgerQuery;
use crate::period::{PeriodMode, ResolvedPeriod};

/// Raw signed ledger sums keyed by account number.
pub type AccountSums = BTreeMap<String, Decimal>;

/// Sums ledger activity per account for a resolved period.
///
/// Returns raw signed sums: credits stay negative. Sign conventions are the
/// caller's job.
pub struct TransactionAggregator<L: LedgerQuery> {
    ledger: Arc<L>,
    timeout: Duration,
}

impl<L: LedgerQuery> Clone for TransactionAggregator<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            timeout: self.timeout,
        }
    }
}

impl<L: LedgerQuery> TransactionAggregator<L> {
    /// Creates an aggregator whose ledger calls are bounded by `timeout`.
    #[must_use]
    pub fn new(ledger: Arc<L>, timeout: Duration) -> Self {
        Self { ledger, timeout }
    }

    /// Sums each requested account over the period.
    ///
    /// Every requested account is present in the result, zero when it had no
    /// activity. An empty account list returns an empty map without querying.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Timeout`] if the ledger does not answer in time,
    /// or whatever the ledger reports.
    pub async fn sum_accounts(
        &self,
        tenant_id: TenantId,
        accounts: &[String],
        period: &ResolvedPeriod,
    ) -> Result<AccountSums, LedgerError> {
        let requested: BTreeSet<&String> = accounts.iter().collect();
        if requested.is_empty() {
            return Ok(AccountSums::new());
        }
        let accounts: Vec<String> = requested.iter().map(|a| (*a).clone()).collect();

        let query = async {
            match period.mode {
                PeriodMode::MonthlySummary { year, month } => {
                    self.ledger
                        .query_monthly_sums(tenant_id, &accounts, year, month)
                        .await
                }
                PeriodMode::TransactionDetail => {
                    self.ledger
                        .query_account_sums(
                            tenant_id,
                            &accounts,
                            period.start_date,
                            period.end_date,
                            true,
                        )
                        .await
                }
            }
        };

        let rows = tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| LedgerError::Timeout(self.timeout))??;

        debug!(
            %tenant_id,
            accounts = accounts.len(),
            with_activity = rows.len(),
            source = ?period.mode,
            "Summed ledger accounts"
        );

        Ok(accounts
            .into_iter()
            .map(|account| {
                let amount = rows.get(&account).copied().unwrap_or(Decimal::ZERO);
                (account, amount)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::resolve;
    use crate::testing::InMemoryLedger;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn accounts(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::default()
            .with_transaction("410001", d(2026, 1, 5), dec!(-600), true)
            .with_transaction("410001", d(2026, 1, 20), dec!(-400), true)
            .with_transaction("410001", d(2026, 1, 21), dec!(-9999), false)
            .with_transaction("410001", d(2026, 2, 1), dec!(-50), true)
            .with_transaction("510001", d(2026, 1, 31), dec!(400), true)
            .with_monthly("410001", 2026, 1, dec!(-1000))
            .with_monthly("510001", 2026, 1, dec!(400))
    }

    #[tokio::test]
    async fn test_empty_account_list_issues_no_query() {
        let ledger = Arc::new(ledger());
        let aggregator = TransactionAggregator::new(Arc::clone(&ledger), Duration::from_secs(1));
        let period = resolve(d(2026, 1, 1), d(2026, 1, 31), d(2026, 3, 1)).unwrap();

        let sums = aggregator
            .sum_accounts(TenantId::new(), &[], &period)
            .await
            .unwrap();

        assert!(sums.is_empty());
        assert_eq!(ledger.query_count(), 0);
    }

    #[tokio::test]
    async fn test_transaction_detail_sums_posted_only() {
        let ledger = Arc::new(ledger());
        let aggregator = TransactionAggregator::new(Arc::clone(&ledger), Duration::from_secs(1));
        let period = resolve(d(2026, 1, 1), d(2026, 1, 21), d(2026, 3, 1)).unwrap();

        let sums = aggregator
            .sum_accounts(TenantId::new(), &accounts(&["410001", "510001"]), &period)
            .await
            .unwrap();

        // The unposted -9999 draft never appears; 510001 has no activity in range.
        assert_eq!(sums.get("410001"), Some(&dec!(-1000)));
        assert_eq!(sums.get("510001"), Some(&Decimal::ZERO));
        assert_eq!(ledger.detail_query_count(), 1);
        assert_eq!(ledger.monthly_query_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_month_uses_monthly_summary() {
        let ledger = Arc::new(ledger());
        let aggregator = TransactionAggregator::new(Arc::clone(&ledger), Duration::from_secs(1));
        let period = resolve(d(2026, 1, 1), d(2026, 1, 31), d(2026, 3, 1)).unwrap();

        let sums = aggregator
            .sum_accounts(TenantId::new(), &accounts(&["410001", "510001"]), &period)
            .await
            .unwrap();

        assert_eq!(sums.get("410001"), Some(&dec!(-1000)));
        assert_eq!(sums.get("510001"), Some(&dec!(400)));
        assert_eq!(ledger.monthly_query_count(), 1);
        assert_eq!(ledger.detail_query_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_accounts_are_queried_once() {
        let ledger = Arc::new(ledger());
        let aggregator = TransactionAggregator::new(Arc::clone(&ledger), Duration::from_secs(1));
        let period = resolve(d(2026, 1, 1), d(2026, 1, 31), d(2026, 1, 15)).unwrap();

        let sums = aggregator
            .sum_accounts(
                TenantId::new(),
                &accounts(&["410001", "410001", "510001"]),
                &period,
            )
            .await
            .unwrap();

        assert_eq!(sums.len(), 2);
        assert_eq!(ledger.last_account_list(), accounts(&["410001", "510001"]));
    }

    #[tokio::test]
    async fn test_slow_ledger_times_out() {
        let ledger = Arc::new(ledger().with_delay(Duration::from_millis(200)));
        let aggregator = TransactionAggregator::new(ledger, Duration::from_millis(10));
        let period = resolve(d(2026, 1, 1), d(2026, 1, 31), d(2026, 1, 15)).unwrap();

        let err = aggregator
            .sum_accounts(TenantId::new(), &accounts(&["410001"]), &period)
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::Timeout(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_unavailable_ledger_propagates() {
        let ledger = Arc::new(ledger().failing());
        let aggregator = TransactionAggregator::new(ledger, Duration::from_secs(1));
        let period = resolve(d(2026, 1, 1), d(2026, 1, 31), d(2026, 1, 15)).unwrap();

        assert!(matches!(
            aggregator
                .sum_accounts(TenantId::new(), &accounts(&["410001"]), &period)
                .await,
            Err(LedgerError::Unavailable(_))
        ));
    }
}
