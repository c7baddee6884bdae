//! Entry point wiring stores, allocator, preview, reset and history together.

use std::sync::Arc;

use chrono::Utc;
use tally_shared::NumberingConfig;
use tally_shared::types::{ActorId, ListLimit, SequenceId};
use tracing::info;

use crate::numbering::allocator::{RetryPolicy, SequenceAllocator};
use crate::numbering::error::NumberingError;
use crate::numbering::history::HistoryRecorder;
use crate::numbering::memory::{InMemoryHistoryStore, InMemorySequenceStore};
use crate::numbering::preview::PreviewService;
use crate::numbering::reset::{AdminResetService, ResetRequest};
use crate::numbering::store::{HistoryStore, SequenceStore};
use crate::numbering::types::{
    AllocatedNumber, AllocationRequest, DocumentNumberHistory, DocumentSequence, DocumentType,
    NumberPreview, ResetOutcome, SequenceConfig, SequenceDefaults, SequenceResetAudit,
};

/// Document numbering operations over one pair of stores.
#[derive(Clone)]
pub struct NumberingService {
    sequences: Arc<dyn SequenceStore>,
    allocator: SequenceAllocator,
    previewer: PreviewService,
    resetter: AdminResetService,
    recorder: HistoryRecorder,
}

impl NumberingService {
    /// Builds the service from stores and configuration.
    ///
    /// Fails with `InvalidConfig` when auto-provisioning is enabled with
    /// defaults a configuration edit would reject.
    pub fn new(
        sequences: Arc<dyn SequenceStore>,
        history: Arc<dyn HistoryStore>,
        config: &NumberingConfig,
    ) -> Result<Self, NumberingError> {
        let recorder = HistoryRecorder::new(history);
        let mut allocator = SequenceAllocator::new(
            Arc::clone(&sequences),
            recorder.clone(),
            RetryPolicy::from_config(config),
        );
        let mut previewer = PreviewService::new(Arc::clone(&sequences));

        if config.auto_provision {
            let defaults = SequenceDefaults {
                number_length: config.default_number_length,
                start_number: config.default_start_number,
            };
            defaults.validate()?;
            allocator = allocator.with_auto_provision(defaults);
            previewer = previewer.with_auto_provision(defaults);
        }

        Ok(Self {
            resetter: AdminResetService::new(Arc::clone(&sequences), recorder.clone()),
            sequences,
            allocator,
            previewer,
            recorder,
        })
    }

    /// Builds the service over fresh process-local stores.
    pub fn in_memory(config: &NumberingConfig) -> Result<Self, NumberingError> {
        Self::new(
            Arc::new(InMemorySequenceStore::new()),
            Arc::new(InMemoryHistoryStore::new()),
            config,
        )
    }

    /// Lists every sequence with its live counter.
    pub async fn list_sequences(&self) -> Result<Vec<DocumentSequence>, NumberingError> {
        self.sequences.list().await
    }

    /// Reads one sequence.
    pub async fn sequence(
        &self,
        document_type: &DocumentType,
    ) -> Result<DocumentSequence, NumberingError> {
        self.sequences.get(document_type).await
    }

    /// Creates or edits a sequence.
    pub async fn configure(
        &self,
        document_type: &DocumentType,
        config: &SequenceConfig,
    ) -> Result<DocumentSequence, NumberingError> {
        config.validate()?;
        let sequence = self
            .sequences
            .upsert(document_type, config, Utc::now())
            .await?;
        info!(
            document_type = %document_type,
            is_active = sequence.is_active,
            reset_frequency = %sequence.reset_frequency,
            "Sequence configured"
        );
        Ok(sequence)
    }

    /// Previews the next number.
    pub async fn preview(
        &self,
        document_type: &DocumentType,
    ) -> Result<NumberPreview, NumberingError> {
        self.previewer.preview(document_type).await
    }

    /// Allocates the next number.
    pub async fn allocate(
        &self,
        request: &AllocationRequest,
    ) -> Result<AllocatedNumber, NumberingError> {
        self.allocator.allocate(request).await
    }

    /// Resets a sequence addressed by key.
    pub async fn reset(&self, request: &ResetRequest) -> Result<ResetOutcome, NumberingError> {
        self.resetter.reset(request).await
    }

    /// Resets a sequence addressed by surrogate id.
    pub async fn reset_by_id(
        &self,
        id: SequenceId,
        new_start_number: i64,
        actor: Option<ActorId>,
        acknowledge_risk: bool,
    ) -> Result<ResetOutcome, NumberingError> {
        let sequence = self.sequences.get_by_id(id).await?;
        self.resetter
            .reset(&ResetRequest {
                document_type: sequence.document_type,
                new_start_number,
                actor,
                acknowledge_risk,
            })
            .await
    }

    /// Lists issued numbers, most-recent-first.
    pub async fn history(
        &self,
        limit: ListLimit,
        document_type: Option<&DocumentType>,
    ) -> Result<Vec<DocumentNumberHistory>, NumberingError> {
        self.recorder.recent(limit, document_type).await
    }

    /// Lists admin resets for one sequence, most-recent-first.
    pub async fn resets(
        &self,
        document_type: &DocumentType,
        limit: ListLimit,
    ) -> Result<Vec<SequenceResetAudit>, NumberingError> {
        self.recorder.resets(document_type, limit).await
    }
}
