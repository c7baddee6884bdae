//! Sequence allocation.
//!
//! One allocation is a single compare-and-swap round: read the sequence,
//! decide whether the period restarts, compute the next number, and commit
//! counter and reset date together. A lost race re-reads and tries again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use tally_shared::NumberingConfig;
use tracing::{debug, info, warn};

use crate::numbering::error::NumberingError;
use crate::numbering::format;
use crate::numbering::history::HistoryRecorder;
use crate::numbering::policy;
use crate::numbering::store::SequenceStore;
use crate::numbering::types::{
    AllocatedNumber, AllocationRequest, CasOutcome, CasUpdate, DocumentSequence, DocumentType,
    NumberingWarning, SequenceDefaults,
};

/// Bounded retry schedule for lost compare-and-swap races.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff ceiling after the first lost race.
    pub base_delay: Duration,
    /// Backoff ceiling never exceeds this.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Builds the schedule from configuration.
    #[must_use]
    pub fn from_config(config: &NumberingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Upper bound of the sleep after losing attempt `attempt` (1-based).
    #[must_use]
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Full-jitter sleep in `0..=ceiling(attempt)`.
    fn jittered(&self, attempt: u32) -> Duration {
        let ceiling = u64::try_from(self.ceiling(attempt).as_micros()).unwrap_or(u64::MAX);
        Duration::from_micros(rand::rng().random_range(0..=ceiling))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&NumberingConfig::default())
    }
}

/// What the next allocation would produce from a given sequence state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextNumber {
    /// Numeric part.
    pub numeric_value: i64,
    /// Formatted number.
    pub full_document_number: String,
    /// Whether a reset boundary was crossed.
    pub reset_applied: bool,
    /// Reset date to commit with the counter.
    pub last_reset_date: Option<DateTime<Utc>>,
    /// Warnings the allocation would raise.
    pub warnings: Vec<NumberingWarning>,
}

/// Computes the next number for `sequence` at `now` without touching storage.
///
/// When a reset is due the counter restarts from `start_number` and the reset
/// date moves to `now`; otherwise it continues from `current_number`. Numbers
/// wider than `number_length` are kept whole and flagged.
pub fn next_number(
    sequence: &DocumentSequence,
    now: DateTime<Utc>,
) -> Result<NextNumber, NumberingError> {
    let reset_applied = policy::reset_due(sequence.reset_frequency, sequence.last_reset_date, now);
    let (base, last_reset_date) = if reset_applied {
        (sequence.start_number - 1, Some(now))
    } else {
        (sequence.current_number, sequence.last_reset_date)
    };

    let numeric_value = base.checked_add(1).ok_or_else(|| {
        NumberingError::InvalidConfig(format!(
            "sequence {} has exhausted its counter",
            sequence.document_type
        ))
    })?;

    let mut warnings = Vec::new();
    if format::exceeds_length(numeric_value, sequence.number_length) {
        warnings.push(NumberingWarning::NumberLengthExceeded {
            document_type: sequence.document_type.clone(),
            number_length: sequence.number_length,
            digits: format::digit_count(numeric_value),
            numeric_value,
        });
    }

    let full_document_number = format::format(
        &sequence.prefix,
        numeric_value,
        sequence.number_length,
        &sequence.suffix,
        sequence.format_template.as_deref(),
    );

    Ok(NextNumber {
        numeric_value,
        full_document_number,
        reset_applied,
        last_reset_date,
        warnings,
    })
}

/// Issues numbers from sequences.
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn SequenceStore>,
    recorder: HistoryRecorder,
    retry: RetryPolicy,
    provisioning: Option<SequenceDefaults>,
}

impl SequenceAllocator {
    /// Creates an allocator that fails with `NotFound` for unknown types.
    #[must_use]
    pub fn new(store: Arc<dyn SequenceStore>, recorder: HistoryRecorder, retry: RetryPolicy) -> Self {
        Self {
            store,
            recorder,
            retry,
            provisioning: None,
        }
    }

    /// Provisions unknown document types with `defaults` on first allocation.
    #[must_use]
    pub fn with_auto_provision(mut self, defaults: SequenceDefaults) -> Self {
        self.provisioning = Some(defaults);
        self
    }

    /// Allocates the next number at the current time.
    pub async fn allocate(
        &self,
        request: &AllocationRequest,
    ) -> Result<AllocatedNumber, NumberingError> {
        self.allocate_at(request, Utc::now()).await
    }

    /// Allocates the next number as of `now`.
    pub async fn allocate_at(
        &self,
        request: &AllocationRequest,
        now: DateTime<Utc>,
    ) -> Result<AllocatedNumber, NumberingError> {
        // Stored timestamps carry microseconds; compare like with like.
        let now = now.trunc_subsecs(6);
        let document_type = &request.document_type;

        for attempt in 1..=self.retry.max_attempts {
            let sequence = self.load(document_type, now).await?;
            if !sequence.is_active {
                return Err(NumberingError::Inactive(document_type.to_string()));
            }

            let next = next_number(&sequence, now)?;
            let update = CasUpdate {
                document_type: document_type.clone(),
                expected_current_number: sequence.current_number,
                expected_last_reset_date: sequence.last_reset_date,
                new_current_number: next.numeric_value,
                new_last_reset_date: next.last_reset_date,
            };

            match self.commit(update).await? {
                CasOutcome::Committed => return Ok(self.finish(request, next, now).await),
                CasOutcome::Mismatch { current_number } => {
                    debug!(
                        document_type = %document_type,
                        attempt,
                        expected = sequence.current_number,
                        found = current_number,
                        "Lost compare-and-swap race"
                    );
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.jittered(attempt)).await;
                    }
                }
            }
        }

        warn!(
            document_type = %document_type,
            attempts = self.retry.max_attempts,
            "Allocation gave up after exhausting retries"
        );
        Err(NumberingError::Contention {
            document_type: document_type.to_string(),
            attempts: self.retry.max_attempts,
        })
    }

    async fn load(
        &self,
        document_type: &DocumentType,
        now: DateTime<Utc>,
    ) -> Result<DocumentSequence, NumberingError> {
        match self.store.get(document_type).await {
            Err(NumberingError::NotFound(key)) => match self.provisioning {
                Some(defaults) => {
                    info!(document_type = %document_type, "Provisioning sequence on first use");
                    self.store
                        .provision(DocumentSequence::with_defaults(
                            document_type.clone(),
                            &defaults,
                            now,
                        ))
                        .await
                }
                None => Err(NumberingError::NotFound(key)),
            },
            other => other,
        }
    }

    /// Issues the write on its own task so a dropped caller cannot cancel it mid-flight.
    async fn commit(&self, update: CasUpdate) -> Result<CasOutcome, NumberingError> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move { store.update(&update).await })
            .await
            .map_err(|e| {
                NumberingError::StoreUnavailable(format!("compare-and-swap task failed: {e}"))
            })?
    }

    async fn finish(
        &self,
        request: &AllocationRequest,
        next: NextNumber,
        now: DateTime<Utc>,
    ) -> AllocatedNumber {
        let mut warnings = next.warnings;
        for warning in &warnings {
            warn!(
                document_type = %request.document_type,
                code = warning.code(),
                numeric_value = next.numeric_value,
                "Allocation raised a warning"
            );
        }

        if let Some(gap) = self
            .recorder
            .record_allocation(
                &request.document_type,
                request.document_id,
                next.numeric_value,
                &next.full_document_number,
                request.actor,
                now,
            )
            .await
        {
            warnings.push(gap);
        }

        info!(
            document_type = %request.document_type,
            full_document_number = %next.full_document_number,
            numeric_value = next.numeric_value,
            reset_applied = next.reset_applied,
            "Document number allocated"
        );

        AllocatedNumber {
            document_type: request.document_type.clone(),
            full_document_number: next.full_document_number,
            numeric_value: next.numeric_value,
            reset_applied: next.reset_applied,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::types::ResetFrequency;
    use chrono::TimeZone;

    fn sequence(current_number: i64, number_length: u32) -> DocumentSequence {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut sequence = DocumentSequence::with_defaults(
            DocumentType::parse("invoice").unwrap(),
            &SequenceDefaults::default(),
            now,
        );
        sequence.prefix = "INV-".to_string();
        sequence.current_number = current_number;
        sequence.number_length = number_length;
        sequence
    }

    #[test]
    fn test_next_number_continues_counter() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let next = next_number(&sequence(40, 4), now).unwrap();
        assert_eq!(next.numeric_value, 41);
        assert_eq!(next.full_document_number, "INV-0041");
        assert!(!next.reset_applied);
        assert_eq!(next.last_reset_date, None);
        assert!(next.warnings.is_empty());
    }

    #[test]
    fn test_next_number_restarts_after_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let mut seq = sequence(57, 3);
        seq.reset_frequency = ResetFrequency::Yearly;
        seq.last_reset_date = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        seq.start_number = 1;

        let next = next_number(&seq, now).unwrap();
        assert_eq!(next.numeric_value, 1);
        assert!(next.reset_applied);
        assert_eq!(next.last_reset_date, Some(now));
    }

    #[test]
    fn test_next_number_restart_honours_start_number() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let mut seq = sequence(57, 4);
        seq.reset_frequency = ResetFrequency::Monthly;
        seq.start_number = 1000;
        assert_eq!(next_number(&seq, now).unwrap().numeric_value, 1000);
    }

    #[test]
    fn test_next_number_flags_overflow_without_truncating() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let next = next_number(&sequence(9_999, 4), now).unwrap();
        assert_eq!(next.numeric_value, 10_000);
        assert_eq!(next.full_document_number, "INV-10000");
        assert!(matches!(
            next.warnings.as_slice(),
            [NumberingWarning::NumberLengthExceeded { digits: 5, .. }]
        ));
    }

    #[test]
    fn test_next_number_rejects_counter_exhaustion() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            next_number(&sequence(i64::MAX, 18), now),
            Err(NumberingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_retry_ceiling_is_capped() {
        let retry = RetryPolicy {
            max_attempts: 8,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(200),
        };
        assert_eq!(retry.ceiling(1), Duration::from_millis(5));
        assert_eq!(retry.ceiling(2), Duration::from_millis(10));
        assert_eq!(retry.ceiling(6), Duration::from_millis(160));
        assert_eq!(retry.ceiling(7), Duration::from_millis(200));
        assert_eq!(retry.ceiling(40), Duration::from_millis(200));
        for attempt in 1..10 {
            assert!(retry.jittered(attempt) <= retry.ceiling(attempt));
        }
    }

    #[test]
    fn test_retry_policy_never_zero_attempts() {
        let config = NumberingConfig {
            max_attempts: 0,
            ..NumberingConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }
}
