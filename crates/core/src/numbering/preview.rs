//! Read-only projection of the next number.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::numbering::allocator::next_number;
use crate::numbering::error::NumberingError;
use crate::numbering::store::SequenceStore;
use crate::numbering::types::{DocumentSequence, DocumentType, NumberPreview, SequenceDefaults};

/// Answers "what would the next number be" without writing anything.
///
/// The answer is advisory: a concurrent allocation may take the previewed
/// number before the caller does.
#[derive(Clone)]
pub struct PreviewService {
    store: Arc<dyn SequenceStore>,
    provisioning: Option<SequenceDefaults>,
}

impl PreviewService {
    /// Creates a preview service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SequenceStore>) -> Self {
        Self {
            store,
            provisioning: None,
        }
    }

    /// Previews unknown types as if provisioned with `defaults`.
    #[must_use]
    pub fn with_auto_provision(mut self, defaults: SequenceDefaults) -> Self {
        self.provisioning = Some(defaults);
        self
    }

    /// Previews the next number at the current time.
    pub async fn preview(&self, document_type: &DocumentType) -> Result<NumberPreview, NumberingError> {
        self.preview_at(document_type, Utc::now()).await
    }

    /// Previews the next number as of `now`.
    pub async fn preview_at(
        &self,
        document_type: &DocumentType,
        now: DateTime<Utc>,
    ) -> Result<NumberPreview, NumberingError> {
        let sequence = match self.store.get(document_type).await {
            Err(NumberingError::NotFound(key)) => match self.provisioning {
                Some(defaults) => {
                    DocumentSequence::with_defaults(document_type.clone(), &defaults, now)
                }
                None => return Err(NumberingError::NotFound(key)),
            },
            other => other?,
        };

        if !sequence.is_active {
            return Err(NumberingError::Inactive(document_type.to_string()));
        }

        let next = next_number(&sequence, now)?;
        Ok(NumberPreview {
            document_type: document_type.clone(),
            preview_number: next.full_document_number,
            numeric_value: next.numeric_value,
            reset_pending: next.reset_applied,
            warnings: next.warnings,
        })
    }
}
