//! Statement engine: resolves the period, fans out the ledger sums and
//! joins them into a [`Report`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use futures::{StreamExt, TryStreamExt, stream};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dealerbook_shared::{ReportConfig, TenantId};

use super::allocation::allocation_statement;
use super::assembler::{StatementParts, assemble};
use super::category::{compute_category, department_statement};
use super::consolidation::consolidate;
use super::error::StatementError;
use super::non_operating::extract;
use super::overhead::compute_overhead;
use super::types::{CategoryTotal, NonOperatingTotals, OverheadStatement, PeriodMetadata, Report};
use crate::aggregation::{AccountSums, LedgerError, LedgerQuery, TransactionAggregator};
use crate::chart::{ChartIndex, ChartStore, Department, MappingRegistry, NonOperatingKind};
use crate::period::{ResolvedPeriod, resolve};

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on a single ledger call.
    pub ledger_timeout: Duration,
    /// Maximum ledger calls in flight for one statement.
    pub max_concurrency: usize,
    /// Add unmapped activity to the overhead grand total.
    pub include_unmapped_in_overhead: bool,
    /// Precision of the presented allocation shares, at most [`Decimal::MAX_SCALE`].
    pub presentation_decimal_places: u32,
    /// Zone whose calendar decides "today".
    pub timezone: Tz,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for EngineOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            ledger_timeout: Duration::from_secs(config.ledger_timeout_secs),
            max_concurrency: config.max_concurrency.max(1),
            include_unmapped_in_overhead: config.include_unmapped_in_overhead,
            presentation_decimal_places: config
                .presentation_decimal_places
                .min(Decimal::MAX_SCALE),
            timezone: config.timezone,
        }
    }
}

/// The calendar date in `timezone` at the instant `now`.
#[must_use]
pub fn local_today(now: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    now.with_timezone(&timezone).date_naive()
}

/// Which part of the statement a ledger call feeds.
#[derive(Debug, Clone, Copy)]
enum Target {
    Category(usize),
    Expense(usize),
    NonOperating(NonOperatingKind),
    Unmapped,
}

/// Ledger sums gathered for one statement, grouped by target.
#[derive(Default)]
struct GatheredSums {
    categories: Vec<AccountSums>,
    expenses: Vec<AccountSums>,
    non_operating: BTreeMap<NonOperatingKind, AccountSums>,
    unmapped: AccountSums,
}

/// Generates departmental statements for any tenant.
///
/// Stateless apart from the registry's chart cache, so one engine serves
/// concurrent requests across tenants.
pub struct StatementEngine<L: LedgerQuery, S: ChartStore> {
    registry: MappingRegistry<S>,
    aggregator: TransactionAggregator<L>,
    options: EngineOptions,
}

impl<L: LedgerQuery, S: ChartStore> StatementEngine<L, S> {
    /// Creates an engine over a ledger and a chart registry.
    #[must_use]
    pub fn new(ledger: Arc<L>, registry: MappingRegistry<S>, options: EngineOptions) -> Self {
        Self {
            registry,
            aggregator: TransactionAggregator::new(ledger, options.ledger_timeout),
            options,
        }
    }

    /// The chart registry, for cache invalidation.
    #[must_use]
    pub fn registry(&self) -> &MappingRegistry<S> {
        &self.registry
    }

    /// Engine options.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Generates a statement as of today in the configured time zone.
    pub async fn generate_statement(
        &self,
        tenant_id: TenantId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        detail: bool,
    ) -> Result<Report, StatementError> {
        let today = local_today(Utc::now(), self.options.timezone);
        self.generate_statement_at(tenant_id, start_date, end_date, detail, today)
            .await
    }

    /// Generates a statement, aborting with [`StatementError::Cancelled`] as
    /// soon as `cancel` fires. In-flight ledger calls are dropped.
    pub async fn generate_statement_cancellable(
        &self,
        tenant_id: TenantId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        detail: bool,
        cancel: &CancellationToken,
    ) -> Result<Report, StatementError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(%tenant_id, "Statement generation cancelled");
                Err(StatementError::Cancelled)
            }
            result = self.generate_statement(tenant_id, start_date, end_date, detail) => result,
        }
    }

    /// Generates a statement with an explicit "today", which decides whether
    /// a full month is closed.
    ///
    /// # Errors
    ///
    /// - [`StatementError::Period`] for an inverted range, before any query
    /// - [`StatementError::Chart`] when the tenant has no valid configuration
    /// - [`StatementError::Ledger`] when any ledger call fails or times out;
    ///   nothing partial is returned
    pub async fn generate_statement_at(
        &self,
        tenant_id: TenantId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        detail: bool,
        today: NaiveDate,
    ) -> Result<Report, StatementError> {
        let period = resolve(start_date, end_date, today)?;
        let index = self.registry.lookup(tenant_id).await?;

        info!(
            %tenant_id,
            %start_date,
            %end_date,
            source = ?period.mode,
            detail,
            "Generating departmental statement"
        );

        let sums = self.gather(tenant_id, &index, period).await?;
        let chart = index.chart();

        let departments: Vec<_> = Department::OPERATING
            .into_iter()
            .map(|department| {
                let categories = index
                    .categories()
                    .iter()
                    .zip(&sums.categories)
                    .filter(|(definition, _)| definition.department == department)
                    .map(|(definition, category_sums)| {
                        compute_category(&index, definition, category_sums, detail)
                    })
                    .collect();
                department_statement(department, categories)
            })
            .collect();

        let overhead = compute_overhead(
            &index,
            &sums.expenses,
            &sums.unmapped,
            self.options.include_unmapped_in_overhead,
            detail,
        );
        for gap in &overhead.unmapped {
            warn!(
                %tenant_id,
                account_no = %gap.account_no,
                amount = %gap.amount,
                "Unmapped account activity"
            );
        }

        let non_operating = extract(&index, &sums.non_operating, detail);
        let months = period.months();
        let consolidated = consolidate(
            &departments,
            non_operating.revenue_adjustment,
            &chart.groupings,
            months,
        );
        let allocation = allocation_statement(
            overhead.grand_total,
            &chart.allocation,
            self.options.presentation_decimal_places,
        );

        let report = assemble(StatementParts {
            tenant_id,
            dealership: chart.dealership.clone(),
            period: PeriodMetadata {
                start_date: period.start_date,
                end_date: period.end_date,
                mode: period.mode,
                months,
                detail,
            },
            departments,
            consolidated,
            overhead,
            allocation,
            non_operating,
            absorption_grouping: chart.absorption_grouping.clone(),
        });

        info!(
            %tenant_id,
            sales = %report.consolidated.grand_total.sales,
            gross_profit = %report.bottom_line.gross_profit,
            pre_tax_income = %report.bottom_line.pre_tax_income,
            unmapped = report.overhead.unmapped.len(),
            "Departmental statement generated"
        );
        Ok(report)
    }

    /// Computes one category's totals. Unknown categories are zero.
    pub async fn compute_category(
        &self,
        tenant_id: TenantId,
        category_key: &str,
        period: &ResolvedPeriod,
    ) -> Result<CategoryTotal, StatementError> {
        let index = self.registry.lookup(tenant_id).await?;
        let Some(definition) = index.category(category_key) else {
            debug!(%tenant_id, category_key, "Category not configured");
            return Ok(CategoryTotal::default());
        };
        let sums = self
            .aggregator
            .sum_accounts(tenant_id, &definition.accounts(), period)
            .await?;
        Ok(compute_category(&index, definition, &sums, false).totals)
    }

    /// Computes the overhead block on its own.
    pub async fn compute_overhead(
        &self,
        tenant_id: TenantId,
        period: &ResolvedPeriod,
    ) -> Result<OverheadStatement, StatementError> {
        let index = self.registry.lookup(tenant_id).await?;
        let mut expenses = Vec::with_capacity(index.chart().expense_categories.len());
        for idx in 0..index.chart().expense_categories.len() {
            expenses.push(
                self.aggregator
                    .sum_accounts(tenant_id, index.expense_accounts(idx), period)
                    .await?,
            );
        }
        let unmapped = self
            .aggregator
            .sum_accounts(tenant_id, index.unmapped_accounts(), period)
            .await?;
        Ok(compute_overhead(
            &index,
            &expenses,
            &unmapped,
            self.options.include_unmapped_in_overhead,
            false,
        ))
    }

    /// Extracts the non-operating figures on their own.
    pub async fn extract_non_operating(
        &self,
        tenant_id: TenantId,
        period: &ResolvedPeriod,
    ) -> Result<NonOperatingTotals, StatementError> {
        let index = self.registry.lookup(tenant_id).await?;
        let mut sums = BTreeMap::new();
        for kind in NonOperatingKind::ALL {
            let bucket = self
                .aggregator
                .sum_accounts(tenant_id, index.non_operating_accounts(kind), period)
                .await?;
            sums.insert(kind, bucket);
        }
        Ok(extract(&index, &sums, false))
    }

    /// Runs every sub-aggregation with bounded concurrency.
    ///
    /// Results come back in submission order. The first failure drops the
    /// remaining calls and fails the whole statement.
    async fn gather(
        &self,
        tenant_id: TenantId,
        index: &ChartIndex,
        period: ResolvedPeriod,
    ) -> Result<GatheredSums, LedgerError> {
        let expense_count = index.chart().expense_categories.len();

        let mut jobs: Vec<(Target, Vec<String>)> = index
            .categories()
            .iter()
            .enumerate()
            .map(|(idx, definition)| (Target::Category(idx), definition.accounts()))
            .collect();
        jobs.extend(
            (0..expense_count).map(|idx| (Target::Expense(idx), index.expense_accounts(idx).to_vec())),
        );
        jobs.extend(NonOperatingKind::ALL.into_iter().map(|kind| {
            (
                Target::NonOperating(kind),
                index.non_operating_accounts(kind).to_vec(),
            )
        }));
        jobs.push((Target::Unmapped, index.unmapped_accounts().to_vec()));

        debug!(
            %tenant_id,
            jobs = jobs.len(),
            max_concurrency = self.options.max_concurrency,
            "Fanning out ledger sums"
        );

        let aggregator = self.aggregator.clone();
        let results: Vec<(Target, AccountSums)> = stream::iter(jobs)
            .map(move |(target, accounts)| {
                let aggregator = aggregator.clone();
                async move {
                    let sums = aggregator.sum_accounts(tenant_id, &accounts, &period).await?;
                    Ok::<_, LedgerError>((target, sums))
                }
            })
            .buffered(self.options.max_concurrency.max(1))
            .try_collect()
            .await?;

        let mut gathered = GatheredSums {
            categories: vec![AccountSums::new(); index.categories().len()],
            expenses: vec![AccountSums::new(); expense_count],
            ..GatheredSums::default()
        };
        for (target, sums) in results {
            match target {
                Target::Category(idx) => gathered.categories[idx] = sums,
                Target::Expense(idx) => gathered.expenses[idx] = sums,
                Target::NonOperating(kind) => {
                    gathered.non_operating.insert(kind, sums);
                }
                Target::Unmapped => gathered.unmapped = sums,
            }
        }
        Ok(gathered)
    }
}
