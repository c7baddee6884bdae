//! Document numbering schema.
//!
//! Creates the sequence table, the issued-number history and the reset
//! audit trail.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(DOCUMENT_SEQUENCES_SQL).await?;
        db.execute_unprepared(DOCUMENT_NUMBER_HISTORY_SQL).await?;
        db.execute_unprepared(SEQUENCE_RESETS_SQL).await?;

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

const ENUMS_SQL: &str = r"
CREATE TYPE reset_frequency AS ENUM ('never', 'yearly', 'monthly', 'daily');
";

const DOCUMENT_SEQUENCES_SQL: &str = r"
CREATE TABLE document_sequences (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    document_type VARCHAR(64) NOT NULL UNIQUE,
    prefix VARCHAR(32) NOT NULL DEFAULT '',
    suffix VARCHAR(32) NOT NULL DEFAULT '',
    current_number BIGINT NOT NULL DEFAULT 0,
    start_number BIGINT NOT NULL DEFAULT 1,
    number_length INTEGER NOT NULL DEFAULT 6,
    format_template VARCHAR(128),
    reset_frequency reset_frequency NOT NULL DEFAULT 'never',
    last_reset_date TIMESTAMPTZ,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_sequence_current_number CHECK (current_number >= 0),
    CONSTRAINT chk_sequence_start_number CHECK (start_number >= 1),
    CONSTRAINT chk_sequence_number_length CHECK (number_length BETWEEN 1 AND 18)
);
";

const DOCUMENT_NUMBER_HISTORY_SQL: &str = r"
CREATE TABLE document_number_history (
    id UUID PRIMARY KEY,
    document_type VARCHAR(64) NOT NULL
        REFERENCES document_sequences(document_type) ON DELETE RESTRICT,
    document_id UUID,
    generated_number BIGINT NOT NULL,
    full_document_number VARCHAR(255) NOT NULL,
    generated_by UUID,
    generated_date TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_number_history_type_date
    ON document_number_history(document_type, generated_date DESC);
CREATE INDEX idx_number_history_date ON document_number_history(generated_date DESC);
CREATE INDEX idx_number_history_document
    ON document_number_history(document_id) WHERE document_id IS NOT NULL;
";

const SEQUENCE_RESETS_SQL: &str = r"
CREATE TABLE sequence_resets (
    id UUID PRIMARY KEY,
    document_type VARCHAR(64) NOT NULL
        REFERENCES document_sequences(document_type) ON DELETE RESTRICT,
    previous_number BIGINT NOT NULL,
    new_start_number BIGINT NOT NULL,
    duplicate_risk BOOLEAN NOT NULL,
    highest_in_period BIGINT,
    reset_by UUID,
    reset_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_reset_new_start_number CHECK (new_start_number >= 1)
);

CREATE INDEX idx_sequence_resets_type_date ON sequence_resets(document_type, reset_at DESC);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS sequence_resets;
DROP TABLE IF EXISTS document_number_history;
DROP TABLE IF EXISTS document_sequences;
DROP TYPE IF EXISTS reset_frequency;
";
