use anyhow::Result;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::warn;
use uuid::Uuid;

use crate::database::entities::local_state;

pub const ACTIVE_PROJECT_ID: &str = "active_project_id";
pub const DEVICE_ID: &str = "device_id";
pub const USER_ID: &str = "user_id";

/// Device-local key/value state (active project pointer, device id,
/// signed-in user). The read helpers degrade to `None` on store errors:
/// missing local state is never fatal.
#[derive(Clone)]
pub struct LocalStateService {
    db: DatabaseConnection,
}

impl LocalStateService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match local_state::Entity::find_by_id(key).one(&self.db).await {
            Ok(row) => row.map(|r| r.value),
            Err(err) => {
                warn!("local state read for {key} failed: {err}");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let existing = local_state::Entity::find_by_id(key).one(&self.db).await?;
        match existing {
            Some(row) => {
                let mut active: local_state::ActiveModel = row.into();
                active.value = Set(value.to_string());
                active.update(&self.db).await?;
            }
            None => {
                local_state::ActiveModel {
                    key: Set(key.to_string()),
                    value: Set(value.to_string()),
                }
                .insert(&self.db)
                .await?;
            }
        }
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        local_state::Entity::delete_by_id(key).exec(&self.db).await?;
        Ok(())
    }

    pub async fn active_project_id(&self) -> Option<String> {
        self.get(ACTIVE_PROJECT_ID).await
    }

    pub async fn set_active_project_id(&self, project_id: &str) -> Result<()> {
        self.set(ACTIVE_PROJECT_ID, project_id).await
    }

    pub async fn user_id(&self) -> Option<String> {
        self.get(USER_ID).await
    }

    /// Return the stable device id, minting one on first use.
    pub async fn ensure_device_id(&self) -> Result<String> {
        if let Some(id) = self.get(DEVICE_ID).await {
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        self.set(DEVICE_ID, &id).await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    #[tokio::test]
    async fn set_get_roundtrip_and_overwrite() {
        let db = setup_test_db().await;
        let state = LocalStateService::new(db);

        assert_eq!(state.get("missing").await, None);
        state.set(ACTIVE_PROJECT_ID, "p1").await.unwrap();
        assert_eq!(state.active_project_id().await.as_deref(), Some("p1"));
        state.set(ACTIVE_PROJECT_ID, "p2").await.unwrap();
        assert_eq!(state.active_project_id().await.as_deref(), Some("p2"));

        state.remove(ACTIVE_PROJECT_ID).await.unwrap();
        assert_eq!(state.active_project_id().await, None);
    }

    #[tokio::test]
    async fn device_id_is_minted_once() {
        let db = setup_test_db().await;
        let state = LocalStateService::new(db);
        let first = state.ensure_device_id().await.unwrap();
        let second = state.ensure_device_id().await.unwrap();
        assert_eq!(first, second);
    }
}
