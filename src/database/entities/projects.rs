use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_name: String,
    pub location: String,
    pub status: String,
    pub prime_contractor: String,
    pub engineer: String,
    pub logo_url: Option<String>,
    pub cno_solicitation_no: String,
    pub noab_project_no: String,
    pub contract_duration: String,
    pub notice_to_proceed: String,
    pub expected_completion: String,
    pub weather_days: i32,
    pub default_start_time: String,
    pub default_end_time: String,
    pub created_by: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contractors::Entity")]
    Contractors,
    #[sea_orm(has_many = "super::project_equipment::Entity")]
    ProjectEquipment,
    #[sea_orm(has_many = "super::reports::Entity")]
    Reports,
}

impl Related<super::contractors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contractors.def()
    }
}

impl Related<super::project_equipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectEquipment.def()
    }
}

impl Related<super::reports::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
