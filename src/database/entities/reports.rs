use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report header: the aggregate root. Raw capture, photos, and generated
/// responses hang off this row and are superseded together.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    /// `YYYY-MM-DD`
    pub report_date: String,
    pub inspector_name: String,
    /// `draft`, `pending_refine`, `refined`, or `submitted`
    pub status: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
    #[sea_orm(has_many = "super::photos::Entity")]
    Photos,
    #[sea_orm(has_many = "super::ai_responses::Entity")]
    AiResponses,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<super::ai_responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AiResponses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
