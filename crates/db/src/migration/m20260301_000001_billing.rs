//! Billing schema migration.
//!
//! Creates master data, contracts, sales documents, the run ledger and the
//! number sequences used by the billing runner.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: MASTER DATA
        // ============================================================
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(ITEMS_SQL).await?;
        db.execute_unprepared(PAYMENT_TERMS_SQL).await?;

        // ============================================================
        // PART 2: CONTRACTS
        // ============================================================
        db.execute_unprepared(CONTRACTS_SQL).await?;
        db.execute_unprepared(CONTRACT_LINES_SQL).await?;

        // ============================================================
        // PART 3: SALES DOCUMENTS
        // ============================================================
        db.execute_unprepared(DOCUMENT_SEQUENCES_SQL).await?;
        db.execute_unprepared(SALES_DOCUMENTS_SQL).await?;
        db.execute_unprepared(SALES_DOCUMENT_LINES_SQL).await?;

        // ============================================================
        // PART 4: RUN LEDGER
        // ============================================================
        db.execute_unprepared(CONTRACT_RUNS_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    -- NULL country means no tax profile is maintained
    country_code CHAR(2),
    is_eu BOOLEAN NOT NULL DEFAULT FALSE,
    is_business BOOLEAN NOT NULL DEFAULT FALSE,
    vat_id VARCHAR(32),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const ITEMS_SQL: &str = r"
CREATE TABLE items (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    net_price NUMERIC(19, 4) NOT NULL CHECK (net_price >= 0),
    tax_rate NUMERIC(7, 4) NOT NULL CHECK (tax_rate BETWEEN 0 AND 1),
    is_discountable BOOLEAN NOT NULL DEFAULT TRUE,
    cost_center VARCHAR(50),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const PAYMENT_TERMS_SQL: &str = r"
CREATE TABLE payment_terms (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    net_days INTEGER NOT NULL CHECK (net_days >= 0),
    discount_days INTEGER CHECK (discount_days >= 0),
    discount_rate NUMERIC(7, 4) CHECK (discount_rate > 0 AND discount_rate < 1),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_discount_complete CHECK ((discount_days IS NULL) = (discount_rate IS NULL)),
    CONSTRAINT chk_discount_before_net CHECK (discount_days IS NULL OR discount_days < net_days)
);
";

const CONTRACTS_SQL: &str = r"
CREATE TABLE contracts (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id),
    billing_interval VARCHAR(20) NOT NULL
        CHECK (billing_interval IN ('MONTHLY', 'QUARTERLY', 'SEMI_ANNUAL', 'ANNUAL')),
    start_date DATE NOT NULL,
    end_date DATE,
    last_run_date DATE,
    next_run_date DATE,
    status VARCHAR(20) NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'active', 'inactive')),
    currency CHAR(3) NOT NULL DEFAULT 'EUR',
    payment_term_id UUID REFERENCES payment_terms(id),
    header_text TEXT,
    footer_text TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_active_has_next_run CHECK (status <> 'active' OR next_run_date IS NOT NULL),
    CONSTRAINT chk_end_after_start CHECK (end_date IS NULL OR end_date >= start_date)
);

CREATE INDEX idx_contracts_due ON contracts(next_run_date) WHERE status = 'active';
CREATE INDEX idx_contracts_customer ON contracts(customer_id);
";

const CONTRACT_LINES_SQL: &str = r"
CREATE TABLE contract_lines (
    id UUID PRIMARY KEY,
    contract_id UUID NOT NULL REFERENCES contracts(id) ON DELETE CASCADE,
    position INTEGER NOT NULL CHECK (position >= 0),
    item_id UUID REFERENCES items(id),
    description TEXT NOT NULL,
    quantity NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4),
    tax_rate NUMERIC(7, 4) CHECK (tax_rate BETWEEN 0 AND 1),
    is_discountable BOOLEAN NOT NULL DEFAULT TRUE,
    discount_percent NUMERIC(7, 4) NOT NULL DEFAULT 0,

    CONSTRAINT uq_contract_line_position UNIQUE (contract_id, position)
);
";

const DOCUMENT_SEQUENCES_SQL: &str = r"
CREATE TABLE document_sequences (
    prefix VARCHAR(10) NOT NULL,
    year INTEGER NOT NULL,
    last_value INTEGER NOT NULL CHECK (last_value > 0),
    PRIMARY KEY (prefix, year)
);
";

const SALES_DOCUMENTS_SQL: &str = r"
CREATE TABLE sales_documents (
    id UUID PRIMARY KEY,
    number VARCHAR(32) UNIQUE,
    document_type VARCHAR(30) NOT NULL
        CHECK (document_type IN ('invoice', 'credit_note', 'quote', 'order_confirmation')),
    status VARCHAR(20) NOT NULL
        CHECK (status IN ('draft', 'issued', 'paid', 'cancelled')),
    issue_date DATE NOT NULL,
    due_date DATE NOT NULL,
    customer_id UUID NOT NULL REFERENCES customers(id),
    payment_term_id UUID REFERENCES payment_terms(id),
    currency CHAR(3) NOT NULL,
    header_text TEXT,
    footer_text TEXT,
    contract_id UUID REFERENCES contracts(id),
    period_start DATE,
    period_end DATE,
    net_total NUMERIC(19, 2) NOT NULL,
    tax_total NUMERIC(19, 2) NOT NULL,
    gross_total NUMERIC(19, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_gross_is_net_plus_tax CHECK (gross_total = net_total + tax_total)
);

-- One generated document per contract period
CREATE UNIQUE INDEX uq_sales_documents_contract_period
    ON sales_documents(contract_id, period_start)
    WHERE contract_id IS NOT NULL;
CREATE INDEX idx_sales_documents_customer ON sales_documents(customer_id, issue_date DESC);
";

const SALES_DOCUMENT_LINES_SQL: &str = r"
CREATE TABLE sales_document_lines (
    id UUID PRIMARY KEY,
    document_id UUID NOT NULL REFERENCES sales_documents(id) ON DELETE CASCADE,
    position INTEGER NOT NULL CHECK (position > 0),
    item_id UUID REFERENCES items(id),
    description TEXT NOT NULL,
    quantity NUMERIC(19, 4) NOT NULL CHECK (quantity >= 0),
    unit_price_net NUMERIC(19, 4) NOT NULL CHECK (unit_price_net >= 0),
    is_discountable BOOLEAN NOT NULL,
    discount_percent NUMERIC(7, 4) NOT NULL CHECK (discount_percent BETWEEN 0 AND 100),
    tax_rate NUMERIC(7, 4) NOT NULL CHECK (tax_rate BETWEEN 0 AND 1),
    net NUMERIC(19, 2) NOT NULL,
    tax NUMERIC(19, 2) NOT NULL,
    gross NUMERIC(19, 2) NOT NULL,

    CONSTRAINT uq_document_line_position UNIQUE (document_id, position),
    CONSTRAINT chk_line_gross CHECK (gross = net + tax)
);
";

const CONTRACT_RUNS_SQL: &str = r"
CREATE TABLE contract_runs (
    id UUID PRIMARY KEY,
    contract_id UUID NOT NULL REFERENCES contracts(id),
    run_at TIMESTAMPTZ NOT NULL,
    period_date DATE NOT NULL,
    outcome VARCHAR(10) NOT NULL CHECK (outcome IN ('SUCCESS', 'FAILED', 'SKIPPED')),
    document_id UUID REFERENCES sales_documents(id),
    error_code VARCHAR(50),
    error_message VARCHAR(200),

    CONSTRAINT chk_document_only_on_success CHECK ((outcome = 'SUCCESS') = (document_id IS NOT NULL))
);

CREATE INDEX idx_contract_runs_contract ON contract_runs(contract_id, run_at DESC);
CREATE INDEX idx_contract_runs_run_at ON contract_runs(run_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_contract_run_mutation
-- The run ledger is append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_contract_run_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'contract_runs is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_contract_run_mutation
BEFORE UPDATE OR DELETE ON contract_runs
FOR EACH ROW
EXECUTE FUNCTION prevent_contract_run_mutation();

-- ============================================================
-- FUNCTION: touch_updated_at
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_contracts_updated_at
BEFORE UPDATE ON contracts
FOR EACH ROW
EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TRIGGER IF EXISTS trg_contracts_updated_at ON contracts;
DROP TRIGGER IF EXISTS trg_prevent_contract_run_mutation ON contract_runs;
DROP FUNCTION IF EXISTS touch_updated_at();
DROP FUNCTION IF EXISTS prevent_contract_run_mutation();

DROP TABLE IF EXISTS contract_runs CASCADE;
DROP TABLE IF EXISTS sales_document_lines CASCADE;
DROP TABLE IF EXISTS sales_documents CASCADE;
DROP TABLE IF EXISTS document_sequences CASCADE;
DROP TABLE IF EXISTS contract_lines CASCADE;
DROP TABLE IF EXISTS contracts CASCADE;
DROP TABLE IF EXISTS payment_terms CASCADE;
DROP TABLE IF EXISTS items CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
";
