//! Operator-initiated counter resets.
//!
//! A reset can make the sequence issue numbers it has already issued in the
//! current period. It is refused unless the caller acknowledges that risk,
//! and every reset that goes through is audited.

use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tally_shared::types::{ActorId, ResetAuditId};
use tracing::warn;

use crate::numbering::error::NumberingError;
use crate::numbering::history::HistoryRecorder;
use crate::numbering::policy;
use crate::numbering::store::SequenceStore;
use crate::numbering::types::{DocumentType, NumberingWarning, ResetOutcome, SequenceResetAudit};

/// Input to an admin reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    /// Sequence to reset.
    pub document_type: DocumentType,
    /// Next number the sequence should issue. Must be at least 1.
    pub new_start_number: i64,
    /// Operator performing the reset.
    pub actor: Option<ActorId>,
    /// Explicit acknowledgement that duplicates may follow.
    pub acknowledge_risk: bool,
}

/// Overwrites sequence counters on operator request.
#[derive(Clone)]
pub struct AdminResetService {
    store: Arc<dyn SequenceStore>,
    recorder: HistoryRecorder,
}

impl AdminResetService {
    /// Creates a reset service.
    #[must_use]
    pub fn new(store: Arc<dyn SequenceStore>, recorder: HistoryRecorder) -> Self {
        Self { store, recorder }
    }

    /// Resets at the current time.
    pub async fn reset(&self, request: &ResetRequest) -> Result<ResetOutcome, NumberingError> {
        self.reset_at(request, Utc::now()).await
    }

    /// Resets as of `now`.
    ///
    /// The next allocation after a successful reset returns exactly
    /// `new_start_number`, unless another reset intervenes.
    pub async fn reset_at(
        &self,
        request: &ResetRequest,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, NumberingError> {
        let document_type = &request.document_type;
        if request.new_start_number < 1 {
            return Err(NumberingError::InvalidConfig(format!(
                "new start number must be at least 1, got {}",
                request.new_start_number
            )));
        }
        if !request.acknowledge_risk {
            return Err(NumberingError::ConfirmationRequired(document_type.to_string()));
        }

        let now = now.trunc_subsecs(6);
        let sequence = self.store.get(document_type).await?;
        let highest_in_period = self
            .recorder
            .highest_since(document_type, policy::period_start(sequence.reset_frequency, now))
            .await?;
        let duplicate_risk = highest_in_period.is_some_and(|h| request.new_start_number <= h);

        let previous_number = self
            .store
            .force_set(document_type, request.new_start_number - 1, now)
            .await?;

        let mut warnings = Vec::new();
        if let Some(highest) = highest_in_period.filter(|_| duplicate_risk) {
            warnings.push(NumberingWarning::DuplicateRisk {
                document_type: document_type.clone(),
                new_start_number: request.new_start_number,
                highest_in_period: highest,
            });
        }

        let audit = SequenceResetAudit {
            id: ResetAuditId::new(),
            document_type: document_type.clone(),
            previous_number,
            new_start_number: request.new_start_number,
            duplicate_risk,
            highest_in_period,
            reset_by: request.actor,
            reset_at: now,
        };
        if let Some(gap) = self.recorder.record_reset(&audit).await {
            warnings.push(gap);
        }

        warn!(
            document_type = %document_type,
            previous_number,
            new_start_number = request.new_start_number,
            duplicate_risk,
            actor = ?request.actor,
            "Sequence counter reset by operator"
        );

        Ok(ResetOutcome {
            document_type: document_type.clone(),
            previous_number,
            new_start_number: request.new_start_number,
            warnings,
        })
    }
}
