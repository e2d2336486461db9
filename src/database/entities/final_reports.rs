use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The archived snapshot written at submission: flattened scalars,
/// per-section presence flags, and JSON-serialized sub-sections.
/// Immutable after insert; deletion is the only supported mutation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "final_reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub report_id: String,
    pub report_date: String,
    pub submitted_at: ChronoDateTimeUtc,
    pub submitted_by: String,

    pub executive_summary: String,
    pub work_performed: String,
    pub materials_used: String,
    pub delays_issues: String,
    pub inspector_notes: String,

    pub general_condition: String,
    pub high_temp: String,
    pub low_temp: String,
    pub precipitation: String,
    pub wind_speed: String,
    pub humidity: String,

    pub has_work_performed: bool,
    pub has_materials: bool,
    pub has_delays: bool,
    pub has_visitors: bool,
    pub has_safety: bool,
    pub has_photos: bool,

    #[sea_orm(column_type = "Text")]
    pub work_performed_json: String,
    #[sea_orm(column_type = "Text")]
    pub materials_json: String,
    #[sea_orm(column_type = "Text")]
    pub delays_json: String,
    #[sea_orm(column_type = "Text")]
    pub visitors_json: String,
    #[sea_orm(column_type = "Text")]
    pub safety_json: String,
    #[sea_orm(column_type = "Text")]
    pub photos_json: String,

    pub work_performed_notes: String,
    pub materials_notes: String,
    pub delays_notes: String,
    pub visitors_notes: String,
    pub safety_notes: String,

    pub pdf_url: String,
    pub pdf_storage_path: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
