//! `SeaORM` entities for the numbering schema.

pub mod document_number_history;
pub mod document_sequences;
pub mod sea_orm_active_enums;
pub mod sequence_resets;
