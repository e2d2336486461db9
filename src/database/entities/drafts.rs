use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Local-only scratch storage for in-progress reports, one row per
/// (project_id, report_date). Deleted on successful submission.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drafts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub report_date: String,
    #[sea_orm(column_type = "Text")]
    pub payload_json: String,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
