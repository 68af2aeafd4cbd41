//! Database migration runner for Dealerbook.
//!
//! Usage:
//!   migrator up      - Create the tenant, mapping and ledger tables
//!   migrator down    - Drop them again
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use dealerbook_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Reads DATABASE_URL and sets up its own tracing
    cli::run_cli(Migrator).await;
}
