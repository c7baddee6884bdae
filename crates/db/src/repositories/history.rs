//! Issued-number history and reset audit repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tally_core::numbering::{
    DocumentNumberHistory, DocumentType, HistoryStore, NumberingError, SequenceResetAudit,
};
use tally_shared::types::{ActorId, DocumentId, HistoryEntryId, ListLimit, ResetAuditId};

use crate::entities::{document_number_history, sequence_resets};
use crate::repositories::sequence::store_error;

/// Append-only history repository implementing [`HistoryStore`].
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    db: DatabaseConnection,
}

impl HistoryRepository {
    /// Creates a new history repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn entry_to_domain(
    model: document_number_history::Model,
) -> Result<DocumentNumberHistory, NumberingError> {
    Ok(DocumentNumberHistory {
        id: HistoryEntryId::from_uuid(model.id),
        document_type: DocumentType::parse(&model.document_type)?,
        document_id: model.document_id.map(DocumentId::from_uuid),
        generated_number: model.generated_number,
        full_document_number: model.full_document_number,
        generated_by: model.generated_by.map(ActorId::from_uuid),
        generated_date: model.generated_date.with_timezone(&Utc),
    })
}

fn reset_to_domain(model: sequence_resets::Model) -> Result<SequenceResetAudit, NumberingError> {
    Ok(SequenceResetAudit {
        id: ResetAuditId::from_uuid(model.id),
        document_type: DocumentType::parse(&model.document_type)?,
        previous_number: model.previous_number,
        new_start_number: model.new_start_number,
        duplicate_risk: model.duplicate_risk,
        highest_in_period: model.highest_in_period,
        reset_by: model.reset_by.map(ActorId::from_uuid),
        reset_at: model.reset_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl HistoryStore for HistoryRepository {
    async fn append(&self, entry: &DocumentNumberHistory) -> Result<(), NumberingError> {
        let row = document_number_history::ActiveModel {
            id: Set(entry.id.into_inner()),
            document_type: Set(entry.document_type.as_str().to_string()),
            document_id: Set(entry.document_id.map(DocumentId::into_inner)),
            generated_number: Set(entry.generated_number),
            full_document_number: Set(entry.full_document_number.clone()),
            generated_by: Set(entry.generated_by.map(ActorId::into_inner)),
            generated_date: Set(entry.generated_date.into()),
        };
        row.insert(&self.db).await.map_err(store_error)?;
        Ok(())
    }

    async fn list(
        &self,
        limit: ListLimit,
        document_type: Option<&DocumentType>,
    ) -> Result<Vec<DocumentNumberHistory>, NumberingError> {
        let mut query = document_number_history::Entity::find();
        if let Some(document_type) = document_type {
            query = query.filter(
                document_number_history::Column::DocumentType.eq(document_type.as_str()),
            );
        }

        query
            .order_by_desc(document_number_history::Column::GeneratedDate)
            .order_by_desc(document_number_history::Column::Id)
            .limit(limit.get())
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(entry_to_domain)
            .collect()
    }

    async fn highest_generated_since(
        &self,
        document_type: &DocumentType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<i64>, NumberingError> {
        let mut query = document_number_history::Entity::find()
            .select_only()
            .column_as(document_number_history::Column::GeneratedNumber.max(), "highest")
            .filter(document_number_history::Column::DocumentType.eq(document_type.as_str()));
        if let Some(since) = since {
            query = query.filter(document_number_history::Column::GeneratedDate.gte(since));
        }

        let highest: Option<Option<i64>> = query
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(highest.flatten())
    }

    async fn record_reset(&self, audit: &SequenceResetAudit) -> Result<(), NumberingError> {
        let row = sequence_resets::ActiveModel {
            id: Set(audit.id.into_inner()),
            document_type: Set(audit.document_type.as_str().to_string()),
            previous_number: Set(audit.previous_number),
            new_start_number: Set(audit.new_start_number),
            duplicate_risk: Set(audit.duplicate_risk),
            highest_in_period: Set(audit.highest_in_period),
            reset_by: Set(audit.reset_by.map(ActorId::into_inner)),
            reset_at: Set(audit.reset_at.into()),
        };
        row.insert(&self.db).await.map_err(store_error)?;
        Ok(())
    }

    async fn list_resets(
        &self,
        document_type: &DocumentType,
        limit: ListLimit,
    ) -> Result<Vec<SequenceResetAudit>, NumberingError> {
        sequence_resets::Entity::find()
            .filter(sequence_resets::Column::DocumentType.eq(document_type.as_str()))
            .order_by_desc(sequence_resets::Column::ResetAt)
            .order_by_desc(sequence_resets::Column::Id)
            .limit(limit.get())
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(reset_to_domain)
            .collect()
    }
}
