//! Storage seams for sequences and their audit trail.
//!
//! Implementations must make [`SequenceStore::update`] atomic per
//! `document_type`: two concurrent updates carrying the same expectation can
//! never both commit. Nothing is required across different keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tally_shared::types::{ListLimit, SequenceId};

use crate::numbering::error::NumberingError;
use crate::numbering::types::{
    CasOutcome, CasUpdate, DocumentNumberHistory, DocumentSequence, DocumentType, SequenceConfig,
    SequenceResetAudit,
};

/// Durable keyed storage of per-document-type counter state.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Reads one sequence, active or not.
    ///
    /// Fails with [`NumberingError::NotFound`] for an unknown key.
    async fn get(&self, document_type: &DocumentType) -> Result<DocumentSequence, NumberingError>;

    /// Reads one sequence by surrogate id.
    async fn get_by_id(&self, id: SequenceId) -> Result<DocumentSequence, NumberingError>;

    /// Lists every sequence ordered by key.
    async fn list(&self) -> Result<Vec<DocumentSequence>, NumberingError>;

    /// Compare-and-swap on counter and reset date.
    ///
    /// Fails with [`NumberingError::NotFound`] for an unknown key and
    /// [`NumberingError::Inactive`] for a disabled sequence; a lost race is
    /// reported as [`CasOutcome::Mismatch`], not as an error.
    async fn update(&self, update: &CasUpdate) -> Result<CasOutcome, NumberingError>;

    /// Creates or edits a sequence's configuration. Not compare-and-swap.
    async fn upsert(
        &self,
        document_type: &DocumentType,
        config: &SequenceConfig,
        now: DateTime<Utc>,
    ) -> Result<DocumentSequence, NumberingError>;

    /// Inserts `sequence` unless its key already exists; returns the stored row.
    async fn provision(&self, sequence: DocumentSequence)
    -> Result<DocumentSequence, NumberingError>;

    /// Unconditionally overwrites counter and reset date in one atomic write.
    ///
    /// Returns the counter value that was overwritten. Reserved for admin resets.
    async fn force_set(
        &self,
        document_type: &DocumentType,
        current_number: i64,
        last_reset_date: DateTime<Utc>,
    ) -> Result<i64, NumberingError>;
}

/// Append-only storage for issued numbers and admin resets.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends one issued number.
    async fn append(&self, entry: &DocumentNumberHistory) -> Result<(), NumberingError>;

    /// Lists issued numbers most-recent-first, optionally for one sequence.
    async fn list(
        &self,
        limit: ListLimit,
        document_type: Option<&DocumentType>,
    ) -> Result<Vec<DocumentNumberHistory>, NumberingError>;

    /// Returns the highest number issued for `document_type` at or after `since`.
    ///
    /// `since = None` considers the whole history.
    async fn highest_generated_since(
        &self,
        document_type: &DocumentType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<i64>, NumberingError>;

    /// Appends one admin reset.
    async fn record_reset(&self, audit: &SequenceResetAudit) -> Result<(), NumberingError>;

    /// Lists admin resets for one sequence, most-recent-first.
    async fn list_resets(
        &self,
        document_type: &DocumentType,
        limit: ListLimit,
    ) -> Result<Vec<SequenceResetAudit>, NumberingError>;
}
