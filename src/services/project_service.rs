use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::entities::{contractors, project_equipment, projects};
use crate::project::{Contractor, ContractorKind, EquipmentCatalogItem, Project};
use crate::services::local_state::LocalStateService;
use crate::utils::soft_timeout;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Loads and persists projects with their contractors and equipment
/// catalog attached. The store does not join, so children are fetched
/// separately and stitched in memory. Read paths degrade to empty on
/// timeout or store error.
#[derive(Clone)]
pub struct ProjectService {
    db: DatabaseConnection,
    timeout: Duration,
}

impl ProjectService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// All projects visible to the user, ordered by name.
    pub async fn load_projects(&self, user_id: Option<&str>) -> Vec<Project> {
        soft_timeout(self.query_projects(user_id), self.timeout, "load_projects")
            .await
            .unwrap_or_default()
    }

    async fn query_projects(&self, user_id: Option<&str>) -> Result<Vec<Project>, DbErr> {
        let mut query = projects::Entity::find().order_by_asc(projects::Column::ProjectName);
        if let Some(user_id) = user_id {
            query = query.filter(projects::Column::CreatedBy.eq(user_id));
        }
        let rows = query.all(&self.db).await?;
        let contractor_rows = contractors::Entity::find().all(&self.db).await?;
        let equipment_rows = project_equipment::Entity::find().all(&self.db).await?;

        let loaded = rows
            .into_iter()
            .map(|row| {
                let project_id = row.id.clone();
                assemble_project(
                    row,
                    contractor_rows
                        .iter()
                        .filter(|c| c.project_id == project_id)
                        .cloned()
                        .collect(),
                    equipment_rows
                        .iter()
                        .filter(|e| e.project_id == project_id)
                        .cloned()
                        .collect(),
                )
            })
            .collect::<Vec<_>>();
        info!("loaded {} projects from the store", loaded.len());
        Ok(loaded)
    }

    /// One project with children, or `None` when missing.
    pub async fn load_project(&self, project_id: &str) -> Option<Project> {
        soft_timeout(self.query_project(project_id), self.timeout, "load_project")
            .await
            .flatten()
    }

    async fn query_project(&self, project_id: &str) -> Result<Option<Project>, DbErr> {
        let Some(row) = projects::Entity::find_by_id(project_id).one(&self.db).await? else {
            return Ok(None);
        };
        let contractor_rows = contractors::Entity::find()
            .filter(contractors::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?;
        let equipment_rows = project_equipment::Entity::find()
            .filter(project_equipment::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?;
        Ok(Some(assemble_project(row, contractor_rows, equipment_rows)))
    }

    /// The project the device is pointed at, with an ownership check when a
    /// user id is recorded.
    pub async fn load_active(&self, state: &LocalStateService) -> Option<Project> {
        let active_id = state.active_project_id().await?;
        let project = self.load_project(&active_id).await?;
        if let Some(user_id) = state.user_id().await {
            if !project.created_by.is_empty() && project.created_by != user_id {
                warn!("active project {active_id} belongs to a different user");
                return None;
            }
        }
        Some(project)
    }

    /// Insert or update a project row from the canonical shape.
    pub async fn save_project(&self, project: &Project) -> Result<Project> {
        let now = Utc::now();
        let id = if project.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            project.id.clone()
        };

        let existing = projects::Entity::find_by_id(&id).one(&self.db).await?;
        match existing {
            Some(row) => {
                let mut active: projects::ActiveModel = row.into();
                apply_project_fields(&mut active, project);
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                let mut active = projects::ActiveModel {
                    id: Set(id.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                apply_project_fields(&mut active, project);
                active.insert(&self.db).await?;
            }
        }

        let mut saved = project.clone();
        saved.id = id;
        Ok(saved)
    }

    /// Projects are never hard-deleted; status is toggled instead.
    pub async fn set_status(&self, project_id: &str, status: &str) -> Result<()> {
        let row = projects::Entity::find_by_id(project_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("Project {project_id} not found"))?;
        let mut active: projects::ActiveModel = row.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Insert or update a contractor under its project.
    pub async fn save_contractor(&self, contractor: &Contractor) -> Result<Contractor> {
        let now = Utc::now();
        let id = if contractor.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            contractor.id.clone()
        };

        let kind = match contractor.kind {
            ContractorKind::Prime => "prime",
            ContractorKind::Sub => "sub",
        };
        let existing = contractors::Entity::find_by_id(&id).one(&self.db).await?;
        match existing {
            Some(row) => {
                let mut active: contractors::ActiveModel = row.into();
                active.name = Set(contractor.name.clone());
                active.company = Set(contractor.company.clone());
                active.abbreviation = Set(contractor.abbreviation.clone());
                active.kind = Set(kind.to_string());
                active.trades = Set(contractor.trades.clone());
                active.status = Set(contractor.status.clone());
                active.removed_date = Set(contractor.removed_date.clone());
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                contractors::ActiveModel {
                    id: Set(id.clone()),
                    project_id: Set(contractor.project_id.clone()),
                    name: Set(contractor.name.clone()),
                    company: Set(contractor.company.clone()),
                    abbreviation: Set(contractor.abbreviation.clone()),
                    kind: Set(kind.to_string()),
                    trades: Set(contractor.trades.clone()),
                    status: Set(if contractor.status.is_empty() {
                        "active".to_string()
                    } else {
                        contractor.status.clone()
                    }),
                    added_date: Set(contractor.added_date.clone()),
                    removed_date: Set(contractor.removed_date.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
            }
        }

        let mut saved = contractor.clone();
        saved.id = id;
        Ok(saved)
    }
}

fn apply_project_fields(active: &mut projects::ActiveModel, project: &Project) {
    active.project_name = Set(project.project_name.clone());
    active.location = Set(project.location.clone());
    active.status = Set(if project.status.is_empty() {
        "active".to_string()
    } else {
        project.status.clone()
    });
    active.prime_contractor = Set(project.prime_contractor.clone());
    active.engineer = Set(project.engineer.clone());
    active.logo_url = Set(project.logo_url.clone());
    active.cno_solicitation_no = Set(project.cno_solicitation_no.clone());
    active.noab_project_no = Set(project.noab_project_no.clone());
    active.contract_duration = Set(project.contract_duration.clone());
    active.notice_to_proceed = Set(project.notice_to_proceed.clone());
    active.expected_completion = Set(project.expected_completion.clone());
    active.weather_days = Set(project.weather_days);
    active.default_start_time = Set(project.default_start_time.clone());
    active.default_end_time = Set(project.default_end_time.clone());
    active.created_by = Set(project.created_by.clone());
}

fn assemble_project(
    row: projects::Model,
    contractor_rows: Vec<contractors::Model>,
    equipment_rows: Vec<project_equipment::Model>,
) -> Project {
    let mut contractors: Vec<Contractor> =
        contractor_rows.into_iter().map(contractor_from_row).collect();
    // Prime contractors first, as every listing renders them
    contractors.sort_by_key(|c| c.kind != ContractorKind::Prime);

    Project {
        id: row.id,
        project_name: row.project_name,
        location: row.location,
        status: row.status,
        prime_contractor: row.prime_contractor,
        engineer: row.engineer,
        logo_url: row.logo_url,
        cno_solicitation_no: row.cno_solicitation_no,
        noab_project_no: row.noab_project_no,
        contract_duration: row.contract_duration,
        notice_to_proceed: row.notice_to_proceed,
        expected_completion: row.expected_completion,
        weather_days: row.weather_days,
        default_start_time: row.default_start_time,
        default_end_time: row.default_end_time,
        created_by: row.created_by,
        contractors,
        equipment: equipment_rows
            .into_iter()
            .map(|e| EquipmentCatalogItem {
                id: e.id,
                project_id: e.project_id,
                kind: e.equipment_type,
                model: e.model,
                status: e.status,
            })
            .collect(),
    }
}

fn contractor_from_row(row: contractors::Model) -> Contractor {
    Contractor {
        id: row.id,
        project_id: row.project_id,
        name: row.name,
        company: row.company,
        abbreviation: row.abbreviation,
        kind: if row.kind == "prime" {
            ContractorKind::Prime
        } else {
            ContractorKind::Sub
        },
        trades: row.trades,
        status: row.status,
        added_date: row.added_date,
        removed_date: row.removed_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    #[tokio::test]
    async fn save_and_reload_project_with_children() {
        let db = setup_test_db().await;
        let service = ProjectService::new(db);

        let saved = service
            .save_project(&Project {
                project_name: "Canal Levee Rehab".to_string(),
                prime_contractor: "Acme Civil".to_string(),
                weather_days: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!saved.id.is_empty());

        service
            .save_contractor(&Contractor {
                project_id: saved.id.clone(),
                name: "Acme Civil".to_string(),
                kind: ContractorKind::Prime,
                ..Default::default()
            })
            .await
            .unwrap();
        service
            .save_contractor(&Contractor {
                project_id: saved.id.clone(),
                name: "Delta Electric".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let loaded = service.load_project(&saved.id).await.unwrap();
        assert_eq!(loaded.project_name, "Canal Levee Rehab");
        assert_eq!(loaded.contractors.len(), 2);
        // Prime sorts first
        assert_eq!(loaded.contractors[0].name, "Acme Civil");
        assert_eq!(loaded.contractors[0].kind, ContractorKind::Prime);
    }

    #[tokio::test]
    async fn missing_project_is_none_not_error() {
        let db = setup_test_db().await;
        let service = ProjectService::new(db);
        assert!(service.load_project("nope").await.is_none());
        assert!(service.load_projects(None).await.is_empty());
    }

    #[tokio::test]
    async fn status_toggle_keeps_row() {
        let db = setup_test_db().await;
        let service = ProjectService::new(db);
        let saved = service
            .save_project(&Project {
                project_name: "Taxiway".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        service.set_status(&saved.id, "archived").await.unwrap();
        let loaded = service.load_project(&saved.id).await.unwrap();
        assert_eq!(loaded.status, "archived");
    }
}
