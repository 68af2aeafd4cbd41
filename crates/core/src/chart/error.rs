//! Chart configuration error types.

use thiserror::Error;

use dealerbook_shared::TenantId;

/// Errors raised while loading or validating a tenant chart.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Tenant has no account mapping configured.
    #[error("no account mapping configured for tenant {0}")]
    ConfigNotFound(TenantId),

    /// Tenant configuration is internally inconsistent.
    #[error("invalid chart configuration for tenant {tenant_id}: {reason}")]
    InvalidConfig {
        /// Tenant whose configuration failed validation.
        tenant_id: TenantId,
        /// What was wrong.
        reason: String,
    },

    /// The configuration store failed.
    #[error("chart store error: {0}")]
    Store(String),
}

impl ChartError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid(tenant_id: TenantId, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            tenant_id,
            reason: reason.into(),
        }
    }

    /// Create a store error.
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}
