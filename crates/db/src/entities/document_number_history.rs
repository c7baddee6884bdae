//! `SeaORM` Entity for document_number_history table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "document_number_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub document_type: String,
    pub document_id: Option<Uuid>,
    pub generated_number: i64,
    pub full_document_number: String,
    pub generated_by: Option<Uuid>,
    pub generated_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::document_sequences::Entity",
        from = "Column::DocumentType",
        to = "super::document_sequences::Column::DocumentType",
        on_delete = "Restrict"
    )]
    DocumentSequences,
}

impl Related<super::document_sequences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentSequences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
