//! `SeaORM` Entity for document_sequences table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ResetFrequency;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "document_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub document_type: String,
    pub prefix: String,
    pub suffix: String,
    pub current_number: i64,
    pub start_number: i64,
    pub number_length: i32,
    pub format_template: Option<String>,
    pub reset_frequency: ResetFrequency,
    pub last_reset_date: Option<DateTimeWithTimeZone>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document_number_history::Entity")]
    DocumentNumberHistory,
    #[sea_orm(has_many = "super::sequence_resets::Entity")]
    SequenceResets,
}

impl Related<super::document_number_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentNumberHistory.def()
    }
}

impl Related<super::sequence_resets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SequenceResets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
