use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Webhook payloads that could not be delivered, held locally until the
/// user retries. Drained on successful delivery.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refine_queue")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub report_id: String,
    #[sea_orm(column_type = "Text")]
    pub payload_json: String,
    pub queued_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
