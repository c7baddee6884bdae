//! Sequence repository backed by Postgres.
//!
//! Allocation uses a conditional `UPDATE` keyed on the expected counter and
//! reset date; exactly one row affected means the swap committed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::numbering::{
    CasOutcome, CasUpdate, DocumentSequence, DocumentType, NumberingError, SequenceConfig,
    SequenceStore,
};
use tally_shared::types::SequenceId;
use tracing::debug;

use crate::entities::document_sequences;

/// Sequence repository implementing [`SequenceStore`].
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        document_type: &DocumentType,
    ) -> Result<document_sequences::Model, NumberingError> {
        document_sequences::Entity::find()
            .filter(document_sequences::Column::DocumentType.eq(document_type.as_str()))
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or_else(|| NumberingError::NotFound(document_type.to_string()))
    }
}

pub(crate) fn store_error(e: DbErr) -> NumberingError {
    NumberingError::StoreUnavailable(e.to_string())
}

fn to_domain(model: document_sequences::Model) -> Result<DocumentSequence, NumberingError> {
    let number_length = u32::try_from(model.number_length).map_err(|_| {
        NumberingError::InvalidConfig(format!(
            "stored number_length {} for {} is negative",
            model.number_length, model.document_type
        ))
    })?;

    Ok(DocumentSequence {
        id: SequenceId::from_uuid(model.id),
        document_type: DocumentType::parse(&model.document_type)?,
        prefix: model.prefix,
        suffix: model.suffix,
        current_number: model.current_number,
        start_number: model.start_number,
        number_length,
        format_template: model.format_template,
        reset_frequency: model.reset_frequency.into(),
        last_reset_date: model.last_reset_date.map(|d| d.with_timezone(&Utc)),
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn to_active_model(sequence: &DocumentSequence) -> document_sequences::ActiveModel {
    document_sequences::ActiveModel {
        id: Set(sequence.id.into_inner()),
        document_type: Set(sequence.document_type.as_str().to_string()),
        prefix: Set(sequence.prefix.clone()),
        suffix: Set(sequence.suffix.clone()),
        current_number: Set(sequence.current_number),
        start_number: Set(sequence.start_number),
        number_length: Set(i32::try_from(sequence.number_length).unwrap_or(i32::MAX)),
        format_template: Set(sequence.format_template.clone()),
        reset_frequency: Set(sequence.reset_frequency.into()),
        last_reset_date: Set(sequence.last_reset_date.map(Into::into)),
        is_active: Set(sequence.is_active),
        created_at: Set(sequence.created_at.into()),
        updated_at: Set(sequence.updated_at.into()),
    }
}

#[async_trait]
impl SequenceStore for SequenceRepository {
    async fn get(&self, document_type: &DocumentType) -> Result<DocumentSequence, NumberingError> {
        to_domain(self.find_model(document_type).await?)
    }

    async fn get_by_id(&self, id: SequenceId) -> Result<DocumentSequence, NumberingError> {
        let model = document_sequences::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or_else(|| NumberingError::NotFound(id.to_string()))?;
        to_domain(model)
    }

    async fn list(&self) -> Result<Vec<DocumentSequence>, NumberingError> {
        document_sequences::Entity::find()
            .order_by_asc(document_sequences::Column::DocumentType)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn update(&self, update: &CasUpdate) -> Result<CasOutcome, NumberingError> {
        let expected_reset = match update.expected_last_reset_date {
            Some(date) => document_sequences::Column::LastResetDate.eq(date),
            None => document_sequences::Column::LastResetDate.is_null(),
        };

        let result = document_sequences::Entity::update_many()
            .col_expr(
                document_sequences::Column::CurrentNumber,
                Expr::value(update.new_current_number),
            )
            .col_expr(
                document_sequences::Column::LastResetDate,
                Expr::value(update.new_last_reset_date),
            )
            .col_expr(document_sequences::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(document_sequences::Column::DocumentType.eq(update.document_type.as_str()))
            .filter(document_sequences::Column::CurrentNumber.eq(update.expected_current_number))
            .filter(expected_reset)
            .filter(document_sequences::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .map_err(store_error)?;

        if result.rows_affected == 1 {
            return Ok(CasOutcome::Committed);
        }

        // Zero rows: unknown key, disabled sequence, or a lost race.
        let current = self.find_model(&update.document_type).await?;
        if !current.is_active {
            return Err(NumberingError::Inactive(update.document_type.to_string()));
        }
        debug!(
            document_type = %update.document_type,
            expected = update.expected_current_number,
            current = current.current_number,
            "conditional update matched no row"
        );
        Ok(CasOutcome::Mismatch {
            current_number: current.current_number,
        })
    }

    async fn upsert(
        &self,
        document_type: &DocumentType,
        config: &SequenceConfig,
        now: DateTime<Utc>,
    ) -> Result<DocumentSequence, NumberingError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        let existing = document_sequences::Entity::find()
            .filter(document_sequences::Column::DocumentType.eq(document_type.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(store_error)?;

        let model = match existing {
            Some(model) => {
                let mut sequence = to_domain(model)?;
                sequence.apply_config(config, now);
                to_active_model(&sequence)
                    .update(&txn)
                    .await
                    .map_err(store_error)?
            }
            None => {
                let sequence = DocumentSequence::from_config(document_type.clone(), config, now);
                to_active_model(&sequence)
                    .insert(&txn)
                    .await
                    .map_err(store_error)?
            }
        };

        txn.commit().await.map_err(store_error)?;
        to_domain(model)
    }

    async fn provision(
        &self,
        sequence: DocumentSequence,
    ) -> Result<DocumentSequence, NumberingError> {
        document_sequences::Entity::insert(to_active_model(&sequence))
            .on_conflict(
                OnConflict::column(document_sequences::Column::DocumentType)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(store_error)?;

        self.get(&sequence.document_type).await
    }

    async fn force_set(
        &self,
        document_type: &DocumentType,
        current_number: i64,
        last_reset_date: DateTime<Utc>,
    ) -> Result<i64, NumberingError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        let model = document_sequences::Entity::find()
            .filter(document_sequences::Column::DocumentType.eq(document_type.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(store_error)?
            .ok_or_else(|| NumberingError::NotFound(document_type.to_string()))?;

        let previous = model.current_number;
        let mut active: document_sequences::ActiveModel = model.into();
        active.current_number = Set(current_number);
        active.last_reset_date = Set(Some(last_reset_date.into()));
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await.map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;
        Ok(previous)
    }
}
