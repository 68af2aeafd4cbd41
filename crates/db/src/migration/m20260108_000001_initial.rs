//! Initial database migration.
//!
//! Creates the tenant configuration tables and the two ledger sources:
//! line-level GL transactions and pre-closed monthly summaries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANTS
        // ============================================================
        db.execute_unprepared(TENANTS_SQL).await?;

        // ============================================================
        // PART 2: CHART OF ACCOUNTS & MAPPINGS
        // ============================================================
        db.execute_unprepared(GL_ACCOUNTS_SQL).await?;
        db.execute_unprepared(ACCOUNT_MAPPINGS_SQL).await?;
        db.execute_unprepared(ACCOUNT_RANGES_SQL).await?;

        // ============================================================
        // PART 3: OVERHEAD & ALLOCATION
        // ============================================================
        db.execute_unprepared(EXPENSE_CATEGORIES_SQL).await?;
        db.execute_unprepared(EXPENSE_CATEGORY_RANGES_SQL).await?;
        db.execute_unprepared(ALLOCATION_WEIGHTS_SQL).await?;
        db.execute_unprepared(DEPARTMENT_GROUPINGS_SQL).await?;

        // ============================================================
        // PART 4: LEDGER
        // ============================================================
        db.execute_unprepared(GL_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(GL_MONTHLY_SUMMARIES_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const TENANTS_SQL: &str = r"
CREATE TABLE tenants (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    code VARCHAR(32) NOT NULL UNIQUE,
    absorption_grouping VARCHAR(64),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const GL_ACCOUNTS_SQL: &str = r"
CREATE TABLE gl_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    account_no VARCHAR(32) NOT NULL,
    description VARCHAR(255) NOT NULL,

    CONSTRAINT uq_gl_accounts_tenant_account UNIQUE (tenant_id, account_no)
);
";

const ACCOUNT_MAPPINGS_SQL: &str = r"
CREATE TABLE account_mappings (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    account_no VARCHAR(32) NOT NULL,
    department VARCHAR(32) NOT NULL,
    role VARCHAR(16) NOT NULL,
    category VARCHAR(64) NOT NULL,
    category_label VARCHAR(255) NOT NULL,

    CONSTRAINT uq_account_mappings_tenant_account UNIQUE (tenant_id, account_no),
    CONSTRAINT chk_account_mappings_department CHECK (department IN (
        'new_equipment', 'used_equipment', 'rental', 'service', 'parts', 'trucking'
    )),
    CONSTRAINT chk_account_mappings_role CHECK (role IN ('revenue', 'cost'))
);

CREATE INDEX idx_account_mappings_tenant ON account_mappings(tenant_id);
";

const ACCOUNT_RANGES_SQL: &str = r"
CREATE TABLE account_ranges (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    purpose VARCHAR(32) NOT NULL,
    range_low BIGINT NOT NULL,
    range_high BIGINT NOT NULL,

    CONSTRAINT chk_account_ranges_purpose CHECK (purpose IN (
        'statement_span', 'revenue_adjustment', 'other_income',
        'interest_expense', 'financing_income'
    )),
    CONSTRAINT chk_account_ranges_bounds CHECK (range_low >= 0 AND range_low <= range_high)
);

CREATE INDEX idx_account_ranges_tenant ON account_ranges(tenant_id);
";

const EXPENSE_CATEGORIES_SQL: &str = r"
CREATE TABLE expense_categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,

    CONSTRAINT uq_expense_categories_tenant_name UNIQUE (tenant_id, name)
);
";

const EXPENSE_CATEGORY_RANGES_SQL: &str = r"
CREATE TABLE expense_category_ranges (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_category_id UUID NOT NULL REFERENCES expense_categories(id) ON DELETE CASCADE,
    range_low BIGINT NOT NULL,
    range_high BIGINT NOT NULL,

    CONSTRAINT chk_expense_category_ranges_bounds CHECK (range_low >= 0 AND range_low <= range_high)
);

CREATE INDEX idx_expense_category_ranges_category ON expense_category_ranges(expense_category_id);
";

const ALLOCATION_WEIGHTS_SQL: &str = r"
CREATE TABLE allocation_weights (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    department VARCHAR(32) NOT NULL,
    weight NUMERIC(7, 6) NOT NULL,

    CONSTRAINT uq_allocation_weights_tenant_department UNIQUE (tenant_id, department),
    CONSTRAINT chk_allocation_weights_department CHECK (department IN (
        'new_equipment', 'used_equipment', 'rental', 'service', 'parts', 'trucking'
    )),
    CONSTRAINT chk_allocation_weights_weight CHECK (weight >= 0 AND weight <= 1)
);
";

const DEPARTMENT_GROUPINGS_SQL: &str = r"
CREATE TABLE department_groupings (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    name VARCHAR(64) NOT NULL,
    department VARCHAR(32) NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,

    CONSTRAINT uq_department_groupings_member UNIQUE (tenant_id, name, department)
);
";

const GL_TRANSACTIONS_SQL: &str = r"
CREATE TABLE gl_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    account_no VARCHAR(32) NOT NULL,
    transaction_date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    posted BOOLEAN NOT NULL DEFAULT false,
    memo TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT fk_gl_transactions_account FOREIGN KEY (tenant_id, account_no)
        REFERENCES gl_accounts(tenant_id, account_no)
);

CREATE INDEX idx_gl_transactions_lookup
    ON gl_transactions(tenant_id, account_no, transaction_date);
";

const GL_MONTHLY_SUMMARIES_SQL: &str = r"
CREATE TABLE gl_monthly_summaries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    account_no VARCHAR(32) NOT NULL,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    closed_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT fk_gl_monthly_summaries_account FOREIGN KEY (tenant_id, account_no)
        REFERENCES gl_accounts(tenant_id, account_no),
    CONSTRAINT uq_gl_monthly_summaries_period UNIQUE (tenant_id, account_no, year, month),
    CONSTRAINT chk_gl_monthly_summaries_month CHECK (month BETWEEN 1 AND 12)
);

CREATE INDEX idx_gl_monthly_summaries_lookup
    ON gl_monthly_summaries(tenant_id, year, month);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_tenants_updated_at
    BEFORE UPDATE ON tenants
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TRIGGER IF EXISTS trg_tenants_updated_at ON tenants;
DROP FUNCTION IF EXISTS touch_updated_at();

DROP TABLE IF EXISTS gl_monthly_summaries CASCADE;
DROP TABLE IF EXISTS gl_transactions CASCADE;
DROP TABLE IF EXISTS department_groupings CASCADE;
DROP TABLE IF EXISTS allocation_weights CASCADE;
DROP TABLE IF EXISTS expense_category_ranges CASCADE;
DROP TABLE IF EXISTS expense_categories CASCADE;
DROP TABLE IF EXISTS account_ranges CASCADE;
DROP TABLE IF EXISTS account_mappings CASCADE;
DROP TABLE IF EXISTS gl_accounts CASCADE;
DROP TABLE IF EXISTS tenants CASCADE;
";
