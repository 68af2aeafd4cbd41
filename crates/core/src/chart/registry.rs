//! Account mapping registry backed by a tenant configuration store.
//!
//! Charts are loaded per tenant through [`ChartStore`], validated into a
//! [`ChartIndex`] and kept in a short-lived Moka cache so that concurrent
//! statements for the same tenant do not reload configuration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use dealerbook_shared::TenantId;

use super::error::ChartError;
use super::index::ChartIndex;
use super::types::TenantChart;

/// Default cache capacity (number of tenants).
const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Default time-to-live for cached charts (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Store trait for tenant chart configuration.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait ChartStore: Send + Sync {
    /// Loads a tenant's chart, `None` when the tenant has no mapping configured.
    fn load_chart(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Option<TenantChart>, ChartError>> + Send;
}

/// Registry answering "how is this tenant's chart mapped?".
pub struct MappingRegistry<S: ChartStore> {
    store: Arc<S>,
    cache: Cache<TenantId, Arc<ChartIndex>>,
}

impl<S: ChartStore> MappingRegistry<S> {
    /// Creates a registry with default cache settings.
    ///
    /// Default: 256 tenants max, 5 minute TTL.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a registry with custom cache configuration.
    #[must_use]
    pub fn with_config(store: Arc<S>, max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { store, cache }
    }

    /// Returns the validated chart for a tenant.
    ///
    /// # Errors
    ///
    /// - [`ChartError::ConfigNotFound`] if the tenant has no mapping. An empty
    ///   mapping is never substituted.
    /// - [`ChartError::InvalidConfig`] if the stored chart fails validation.
    /// - [`ChartError::Store`] if the store fails.
    pub async fn lookup(&self, tenant_id: TenantId) -> Result<Arc<ChartIndex>, ChartError> {
        if let Some(index) = self.cache.get(&tenant_id).await {
            return Ok(index);
        }

        let chart = self
            .store
            .load_chart(tenant_id)
            .await?
            .ok_or(ChartError::ConfigNotFound(tenant_id))?;

        if chart.mappings.is_empty() {
            return Err(ChartError::ConfigNotFound(tenant_id));
        }
        if chart.tenant_id != tenant_id {
            return Err(ChartError::invalid(
                tenant_id,
                format!("store returned the chart of tenant {}", chart.tenant_id),
            ));
        }

        let index = Arc::new(ChartIndex::build(chart)?);
        debug!(
            %tenant_id,
            categories = index.categories().len(),
            expense_categories = index.chart().expense_categories.len(),
            "Loaded tenant chart"
        );
        self.cache.insert(tenant_id, Arc::clone(&index)).await;
        Ok(index)
    }

    /// Drops a tenant's cached chart so the next lookup reloads it.
    pub async fn invalidate(&self, tenant_id: TenantId) {
        self.cache.invalidate(&tenant_id).await;
    }

    /// Drops every cached chart.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the number of charts currently cached.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}
