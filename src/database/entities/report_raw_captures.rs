use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Original capture for one report. Exactly one row per report id; the
/// save pipeline replaces the whole row rather than patching nested
/// arrays inside `entries_json`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_raw_captures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub report_id: String,
    /// `guided` or `minimal`
    pub capture_mode: String,
    pub freeform_notes: String,
    pub work_summary: String,
    pub issues_notes: String,
    pub safety_notes: String,
    /// Weather snapshot, JSON
    #[sea_orm(column_type = "Text")]
    pub weather_json: String,
    /// Nested region: contractor_work, personnel, equipment_usage,
    /// user_edits
    #[sea_orm(column_type = "Text")]
    pub entries_json: String,
    pub captured_at: ChronoDateTimeUtc,
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
