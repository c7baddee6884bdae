//! `SeaORM` active enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reset_frequency")]
pub enum ResetFrequency {
    #[sea_orm(string_value = "never")]
    Never,
    #[sea_orm(string_value = "yearly")]
    Yearly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "daily")]
    Daily,
}

impl From<tally_core::numbering::ResetFrequency> for ResetFrequency {
    fn from(value: tally_core::numbering::ResetFrequency) -> Self {
        use tally_core::numbering::ResetFrequency as Domain;
        match value {
            Domain::Never => Self::Never,
            Domain::Yearly => Self::Yearly,
            Domain::Monthly => Self::Monthly,
            Domain::Daily => Self::Daily,
        }
    }
}

impl From<ResetFrequency> for tally_core::numbering::ResetFrequency {
    fn from(value: ResetFrequency) -> Self {
        match value {
            ResetFrequency::Never => Self::Never,
            ResetFrequency::Yearly => Self::Yearly,
            ResetFrequency::Monthly => Self::Monthly,
            ResetFrequency::Daily => Self::Daily,
        }
    }
}
