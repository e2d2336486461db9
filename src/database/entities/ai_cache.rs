use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Short-lived local preemption cache: the payload just returned by the
/// refine webhook, keyed by report id. A single-use latch: consumed on
/// first read, honored only while younger than the freshness window.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_cache")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub report_id: String,
    #[sea_orm(column_type = "Text")]
    pub payload_json: String,
    pub cached_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
