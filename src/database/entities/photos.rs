use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub report_id: String,
    /// Path under the remote storage bucket, empty until uploaded
    pub storage_path: String,
    pub filename: String,
    pub caption: String,
    pub taken_at: Option<ChronoDateTimeUtc>,
    pub gps_lat: Option<f64>,
    pub gps_lng: Option<f64>,
    /// `pending` until the blob reaches remote storage, then `uploaded`
    pub sync_status: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reports::Entity",
        from = "Column::ReportId",
        to = "super::reports::Column::Id"
    )]
    Report,
}

impl Related<super::reports::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
