//! Process-local stores.
//!
//! Used by tests and by deployments configured with `numbering.store = "memory"`.
//! Counters live only as long as the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tally_shared::types::{ListLimit, SequenceId};
use tokio::sync::RwLock;

use crate::numbering::error::NumberingError;
use crate::numbering::store::{HistoryStore, SequenceStore};
use crate::numbering::types::{
    CasOutcome, CasUpdate, DocumentNumberHistory, DocumentSequence, DocumentType, SequenceConfig,
    SequenceResetAudit,
};

/// Sequence store backed by a concurrent map.
///
/// Every mutation holds the map's write guard for its key, which serialises
/// writers per `document_type` while leaving other keys untouched.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    sequences: DashMap<DocumentType, DocumentSequence>,
}

impl InMemorySequenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with `sequences`.
    #[must_use]
    pub fn with_sequences(sequences: impl IntoIterator<Item = DocumentSequence>) -> Self {
        let store = Self::new();
        for sequence in sequences {
            store
                .sequences
                .insert(sequence.document_type.clone(), sequence);
        }
        store
    }
}

#[async_trait]
impl SequenceStore for InMemorySequenceStore {
    async fn get(&self, document_type: &DocumentType) -> Result<DocumentSequence, NumberingError> {
        self.sequences
            .get(document_type)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NumberingError::NotFound(document_type.to_string()))
    }

    async fn get_by_id(&self, id: SequenceId) -> Result<DocumentSequence, NumberingError> {
        self.sequences
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NumberingError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<DocumentSequence>, NumberingError> {
        let mut sequences: Vec<DocumentSequence> = self
            .sequences
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sequences.sort_by(|a, b| a.document_type.cmp(&b.document_type));
        Ok(sequences)
    }

    async fn update(&self, update: &CasUpdate) -> Result<CasOutcome, NumberingError> {
        let mut sequence = self
            .sequences
            .get_mut(&update.document_type)
            .ok_or_else(|| NumberingError::NotFound(update.document_type.to_string()))?;

        if !sequence.is_active {
            return Err(NumberingError::Inactive(update.document_type.to_string()));
        }

        if sequence.current_number != update.expected_current_number
            || sequence.last_reset_date != update.expected_last_reset_date
        {
            return Ok(CasOutcome::Mismatch {
                current_number: sequence.current_number,
            });
        }

        sequence.current_number = update.new_current_number;
        sequence.last_reset_date = update.new_last_reset_date;
        sequence.updated_at = Utc::now();
        Ok(CasOutcome::Committed)
    }

    async fn upsert(
        &self,
        document_type: &DocumentType,
        config: &SequenceConfig,
        now: DateTime<Utc>,
    ) -> Result<DocumentSequence, NumberingError> {
        let sequence = self
            .sequences
            .entry(document_type.clone())
            .and_modify(|existing| existing.apply_config(config, now))
            .or_insert_with(|| DocumentSequence::from_config(document_type.clone(), config, now));
        Ok(sequence.value().clone())
    }

    async fn provision(
        &self,
        sequence: DocumentSequence,
    ) -> Result<DocumentSequence, NumberingError> {
        let stored = self
            .sequences
            .entry(sequence.document_type.clone())
            .or_insert(sequence);
        Ok(stored.value().clone())
    }

    async fn force_set(
        &self,
        document_type: &DocumentType,
        current_number: i64,
        last_reset_date: DateTime<Utc>,
    ) -> Result<i64, NumberingError> {
        let mut sequence = self
            .sequences
            .get_mut(document_type)
            .ok_or_else(|| NumberingError::NotFound(document_type.to_string()))?;

        let previous = sequence.current_number;
        sequence.current_number = current_number;
        sequence.last_reset_date = Some(last_reset_date);
        sequence.updated_at = Utc::now();
        Ok(previous)
    }
}

/// History store backed by in-process vectors.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    entries: RwLock<Vec<DocumentNumberHistory>>,
    resets: RwLock<Vec<SequenceResetAudit>>,
}

impl InMemoryHistoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, entry: &DocumentNumberHistory) -> Result<(), NumberingError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn list(
        &self,
        limit: ListLimit,
        document_type: Option<&DocumentType>,
    ) -> Result<Vec<DocumentNumberHistory>, NumberingError> {
        let entries = self.entries.read().await;
        let mut rows: Vec<DocumentNumberHistory> = entries
            .iter()
            .filter(|row| document_type.is_none_or(|t| &row.document_type == t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.generated_date
                .cmp(&a.generated_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(limit.as_usize());
        Ok(rows)
    }

    async fn highest_generated_since(
        &self,
        document_type: &DocumentType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<i64>, NumberingError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|row| &row.document_type == document_type)
            .filter(|row| since.is_none_or(|start| row.generated_date >= start))
            .map(|row| row.generated_number)
            .max())
    }

    async fn record_reset(&self, audit: &SequenceResetAudit) -> Result<(), NumberingError> {
        self.resets.write().await.push(audit.clone());
        Ok(())
    }

    async fn list_resets(
        &self,
        document_type: &DocumentType,
        limit: ListLimit,
    ) -> Result<Vec<SequenceResetAudit>, NumberingError> {
        let resets = self.resets.read().await;
        let mut rows: Vec<SequenceResetAudit> = resets
            .iter()
            .filter(|row| &row.document_type == document_type)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.reset_at.cmp(&a.reset_at).then_with(|| b.id.cmp(&a.id)));
        rows.truncate(limit.as_usize());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::types::{ResetFrequency, SequenceDefaults};
    use chrono::TimeZone;
    use tally_shared::types::HistoryEntryId;

    fn invoice() -> DocumentType {
        DocumentType::parse("invoice").unwrap()
    }

    fn seeded(current_number: i64) -> InMemorySequenceStore {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut sequence =
            DocumentSequence::with_defaults(invoice(), &SequenceDefaults::default(), now);
        sequence.current_number = current_number;
        InMemorySequenceStore::with_sequences([sequence])
    }

    fn cas(expected: i64, new: i64) -> CasUpdate {
        CasUpdate {
            document_type: invoice(),
            expected_current_number: expected,
            expected_last_reset_date: None,
            new_current_number: new,
            new_last_reset_date: None,
        }
    }

    #[tokio::test]
    async fn test_cas_commits_on_match() {
        let store = seeded(40);
        assert_eq!(store.update(&cas(40, 41)).await.unwrap(), CasOutcome::Committed);
        assert_eq!(store.get(&invoice()).await.unwrap().current_number, 41);
    }

    #[tokio::test]
    async fn test_cas_reports_mismatch_without_writing() {
        let store = seeded(42);
        assert_eq!(
            store.update(&cas(40, 41)).await.unwrap(),
            CasOutcome::Mismatch { current_number: 42 }
        );
        assert_eq!(store.get(&invoice()).await.unwrap().current_number, 42);
    }

    #[tokio::test]
    async fn test_cas_compares_reset_date() {
        let store = seeded(0);
        let mut update = cas(0, 1);
        update.expected_last_reset_date = Some(Utc::now());
        assert!(matches!(
            store.update(&update).await.unwrap(),
            CasOutcome::Mismatch { .. }
        ));
    }

    #[tokio::test]
    async fn test_cas_unknown_and_inactive() {
        let store = InMemorySequenceStore::new();
        assert!(matches!(
            store.update(&cas(0, 1)).await,
            Err(NumberingError::NotFound(_))
        ));

        let store = seeded(0);
        let mut config = SequenceConfig {
            prefix: String::new(),
            suffix: String::new(),
            number_length: 6,
            format_template: None,
            reset_frequency: ResetFrequency::Never,
            is_active: false,
            start_number: None,
            current_number: None,
        };
        store.upsert(&invoice(), &config, Utc::now()).await.unwrap();
        assert!(matches!(
            store.update(&cas(0, 1)).await,
            Err(NumberingError::Inactive(_))
        ));

        config.is_active = true;
        store.upsert(&invoice(), &config, Utc::now()).await.unwrap();
        assert_eq!(store.update(&cas(0, 1)).await.unwrap(), CasOutcome::Committed);
    }

    #[tokio::test]
    async fn test_provision_keeps_existing_row() {
        let store = seeded(40);
        let fresh =
            DocumentSequence::with_defaults(invoice(), &SequenceDefaults::default(), Utc::now());
        let stored = store.provision(fresh).await.unwrap();
        assert_eq!(stored.current_number, 40);
    }

    #[tokio::test]
    async fn test_force_set_returns_previous() {
        let store = seeded(40);
        let now = Utc::now();
        assert_eq!(store.force_set(&invoice(), 9, now).await.unwrap(), 40);
        let sequence = store.get(&invoice()).await.unwrap();
        assert_eq!(sequence.current_number, 9);
        assert_eq!(sequence.last_reset_date, Some(now));
    }

    #[tokio::test]
    async fn test_history_highest_since() {
        let history = InMemoryHistoryStore::new();
        let jan = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
        for (number, date) in [(7, jan), (3, feb), (4, feb)] {
            history
                .append(&DocumentNumberHistory {
                    id: HistoryEntryId::new(),
                    document_type: invoice(),
                    document_id: None,
                    generated_number: number,
                    full_document_number: number.to_string(),
                    generated_by: None,
                    generated_date: date,
                })
                .await
                .unwrap();
        }

        assert_eq!(
            history.highest_generated_since(&invoice(), None).await.unwrap(),
            Some(7)
        );
        let feb_start = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            history
                .highest_generated_since(&invoice(), Some(feb_start))
                .await
                .unwrap(),
            Some(4)
        );
        let other = DocumentType::parse("receipt").unwrap();
        assert_eq!(
            history.highest_generated_since(&other, None).await.unwrap(),
            None
        );

        let recent = history.list(ListLimit::new(2), None).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|row| row.generated_date == feb));
    }
}
