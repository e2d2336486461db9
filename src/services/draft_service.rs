use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::entities::drafts;

#[derive(Debug, Clone)]
pub struct DraftEntry {
    pub project_id: String,
    pub report_date: String,
    pub payload: Value,
    pub updated_at: DateTime<Utc>,
}

impl DraftEntry {
    /// Composite key in the `{project_id}_{date}` form listings use.
    pub fn key(&self) -> String {
        format!("{}_{}", self.project_id, self.report_date)
    }
}

/// Local-only scratch storage for in-progress reports, keyed by
/// (project, date). Saved on every keystroke (debounced by the caller)
/// and deleted on successful submission.
#[derive(Clone)]
pub struct DraftService {
    db: DatabaseConnection,
}

impl DraftService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, project_id: &str, date: &str) -> Option<Value> {
        let row = drafts::Entity::find()
            .filter(drafts::Column::ProjectId.eq(project_id))
            .filter(drafts::Column::ReportDate.eq(date))
            .one(&self.db)
            .await
            .unwrap_or_else(|err| {
                warn!("draft lookup failed: {err}");
                None
            })?;
        serde_json::from_str(&row.payload_json).ok()
    }

    pub async fn save(&self, project_id: &str, date: &str, payload: &Value) -> Result<()> {
        let payload_json = serde_json::to_string(payload)?;
        let now = Utc::now();

        let existing = drafts::Entity::find()
            .filter(drafts::Column::ProjectId.eq(project_id))
            .filter(drafts::Column::ReportDate.eq(date))
            .one(&self.db)
            .await?;
        match existing {
            Some(row) => {
                let mut active: drafts::ActiveModel = row.into();
                active.payload_json = Set(payload_json);
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                drafts::ActiveModel {
                    id: Set(Uuid::new_v4().to_string()),
                    project_id: Set(project_id.to_string()),
                    report_date: Set(date.to_string()),
                    payload_json: Set(payload_json),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
            }
        }
        debug!("draft saved for {project_id}_{date}");
        Ok(())
    }

    pub async fn delete(&self, project_id: &str, date: &str) -> Result<()> {
        drafts::Entity::delete_many()
            .filter(drafts::Column::ProjectId.eq(project_id))
            .filter(drafts::Column::ReportDate.eq(date))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn list_all(&self) -> Vec<DraftEntry> {
        let rows = drafts::Entity::find()
            .order_by_desc(drafts::Column::UpdatedAt)
            .all(&self.db)
            .await
            .unwrap_or_else(|err| {
                warn!("draft listing failed: {err}");
                Vec::new()
            });
        rows.into_iter()
            .map(|row| DraftEntry {
                project_id: row.project_id,
                report_date: row.report_date,
                payload: serde_json::from_str(&row.payload_json).unwrap_or(Value::Null),
                updated_at: row.updated_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use serde_json::json;

    #[tokio::test]
    async fn save_is_an_upsert_per_project_and_date() {
        let db = setup_test_db().await;
        let service = DraftService::new(db);

        service.save("p1", "2026-03-02", &json!({"v": 1})).await.unwrap();
        service.save("p1", "2026-03-02", &json!({"v": 2})).await.unwrap();
        service.save("p1", "2026-03-03", &json!({"v": 3})).await.unwrap();

        assert_eq!(service.get("p1", "2026-03-02").await, Some(json!({"v": 2})));
        assert_eq!(service.list_all().await.len(), 2);
    }

    #[tokio::test]
    async fn delete_makes_lookup_miss() {
        let db = setup_test_db().await;
        let service = DraftService::new(db);
        service.save("p1", "2026-03-02", &json!({})).await.unwrap();
        service.delete("p1", "2026-03-02").await.unwrap();
        assert!(service.get("p1", "2026-03-02").await.is_none());
    }
}
