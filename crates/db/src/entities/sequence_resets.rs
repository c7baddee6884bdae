//! `SeaORM` Entity for sequence_resets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sequence_resets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub document_type: String,
    pub previous_number: i64,
    pub new_start_number: i64,
    pub duplicate_risk: bool,
    pub highest_in_period: Option<i64>,
    pub reset_by: Option<Uuid>,
    pub reset_at: DateTimeWithTimeZone,
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
