//! Audit trail of issued numbers.
//!
//! History rows are written after the counter has committed and are not
//! transactionally coupled to it. A failed write is logged and surfaced as
//! [`NumberingWarning::AuditGap`]; the allocation itself still succeeds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_shared::types::{ActorId, DocumentId, HistoryEntryId, ListLimit};
use tracing::error;

use crate::numbering::error::NumberingError;
use crate::numbering::store::HistoryStore;
use crate::numbering::types::{
    DocumentNumberHistory, DocumentType, NumberingWarning, SequenceResetAudit,
};

/// Appends immutable audit rows and answers history queries.
#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn HistoryStore>,
}

impl HistoryRecorder {
    /// Creates a recorder writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Records one issued number.
    ///
    /// Returns an [`NumberingWarning::AuditGap`] if the row could not be written.
    pub async fn record_allocation(
        &self,
        document_type: &DocumentType,
        document_id: Option<DocumentId>,
        generated_number: i64,
        full_document_number: &str,
        generated_by: Option<ActorId>,
        generated_date: DateTime<Utc>,
    ) -> Option<NumberingWarning> {
        let entry = DocumentNumberHistory {
            id: HistoryEntryId::new(),
            document_type: document_type.clone(),
            document_id,
            generated_number,
            full_document_number: full_document_number.to_string(),
            generated_by,
            generated_date,
        };

        match self.store.append(&entry).await {
            Ok(()) => None,
            Err(e) => {
                error!(
                    document_type = %document_type,
                    full_document_number = %full_document_number,
                    error = %e,
                    "Issued number was not written to history"
                );
                Some(NumberingWarning::AuditGap {
                    document_type: document_type.clone(),
                    detail: format!("history row for {full_document_number} not recorded: {e}"),
                })
            }
        }
    }

    /// Records one admin reset.
    ///
    /// Returns an [`NumberingWarning::AuditGap`] if the row could not be written.
    pub async fn record_reset(&self, audit: &SequenceResetAudit) -> Option<NumberingWarning> {
        match self.store.record_reset(audit).await {
            Ok(()) => None,
            Err(e) => {
                error!(
                    document_type = %audit.document_type,
                    error = %e,
                    "Sequence reset was not written to the audit trail"
                );
                Some(NumberingWarning::AuditGap {
                    document_type: audit.document_type.clone(),
                    detail: format!("reset audit row not recorded: {e}"),
                })
            }
        }
    }

    /// Lists issued numbers, most-recent-first.
    pub async fn recent(
        &self,
        limit: ListLimit,
        document_type: Option<&DocumentType>,
    ) -> Result<Vec<DocumentNumberHistory>, NumberingError> {
        self.store.list(limit, document_type).await
    }

    /// Lists admin resets for one sequence, most-recent-first.
    pub async fn resets(
        &self,
        document_type: &DocumentType,
        limit: ListLimit,
    ) -> Result<Vec<SequenceResetAudit>, NumberingError> {
        self.store.list_resets(document_type, limit).await
    }

    /// Returns the highest number issued at or after `since`.
    pub async fn highest_since(
        &self,
        document_type: &DocumentType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<i64>, NumberingError> {
        self.store
            .highest_generated_since(document_type, since)
            .await
    }
}
