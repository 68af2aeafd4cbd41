//! Ledger query interface consumed by the engine.

use std::collections::BTreeMap;
use std::future::Future;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use dealerbook_shared::TenantId;

use super::error::LedgerError;

/// Read-only access to a tenant's general ledger.
///
/// These two shapes are the only queries the engine ever issues. Implementations
/// must bind the account list as a parameter, never interpolate it. Accounts
/// without activity may be omitted from the result.
///
/// The engine only asks about accounts listed in the tenant chart, so every
/// account that can carry ledger activity must be listed there. The Postgres
/// schema enforces this with a foreign key from both ledger tables.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait LedgerQuery: Send + Sync {
    /// Sums transaction amounts per account between `start` and `end` inclusive.
    ///
    /// With `posted_only`, draft and unposted entries are excluded.
    fn query_account_sums(
        &self,
        tenant_id: TenantId,
        accounts: &[String],
        start: NaiveDate,
        end: NaiveDate,
        posted_only: bool,
    ) -> impl Future<Output = Result<BTreeMap<String, Decimal>, LedgerError>> + Send;

    /// Returns the closed monthly summary amount per account.
    fn query_monthly_sums(
        &self,
        tenant_id: TenantId,
        accounts: &[String],
        year: i32,
        month: u32,
    ) -> impl Future<Output = Result<BTreeMap<String, Decimal>, LedgerError>> + Send;
}
