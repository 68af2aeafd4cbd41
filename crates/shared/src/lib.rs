//! Shared types, errors, and configuration for Dealerbook.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for tenant-scoped lookups
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ReportConfig};
pub use error::{AppError, AppResult};
pub use types::{ExpenseCategoryId, GlTransactionId, TenantId};
