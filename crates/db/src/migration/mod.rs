//! Database migrations.
//!
//! Run by the migrator binary and by integration tests before seeding.

pub use sea_orm_migration::prelude::*;

mod m20260108_000001_initial;

/// Applies the dealerbook schema.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260108_000001_initial::Migration)]
    }
}
