use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::database::entities::user_profiles;
use crate::project::UserSettings;
use crate::utils::soft_timeout;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// User settings, keyed by device id.
#[derive(Clone)]
pub struct ProfileService {
    db: DatabaseConnection,
    timeout: Duration,
}

impl ProfileService {
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

    pub async fn load(&self, device_id: &str) -> Option<UserSettings> {
        soft_timeout(self.query(device_id), self.timeout, "load_user_settings")
            .await
            .flatten()
    }

    async fn query(&self, device_id: &str) -> Result<Option<UserSettings>, DbErr> {
        let row = user_profiles::Entity::find()
            .filter(user_profiles::Column::DeviceId.eq(device_id))
            .limit(1)
            .one(&self.db)
            .await?;
        Ok(row.map(|r| UserSettings {
            id: r.id,
            device_id: r.device_id,
            full_name: r.full_name,
            title: r.title,
            company: r.company,
            email: r.email,
            phone: r.phone,
        }))
    }

    pub async fn save(&self, settings: &UserSettings) -> Result<UserSettings> {
        let now = Utc::now();
        let id = if settings.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            settings.id.clone()
        };

        let existing = user_profiles::Entity::find_by_id(&id).one(&self.db).await?;
        match existing {
            Some(row) => {
                let mut active: user_profiles::ActiveModel = row.into();
                active.device_id = Set(settings.device_id.clone());
                active.full_name = Set(settings.full_name.clone());
                active.title = Set(settings.title.clone());
                active.company = Set(settings.company.clone());
                active.email = Set(settings.email.clone());
                active.phone = Set(settings.phone.clone());
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                user_profiles::ActiveModel {
                    id: Set(id.clone()),
                    device_id: Set(settings.device_id.clone()),
                    full_name: Set(settings.full_name.clone()),
                    title: Set(settings.title.clone()),
                    company: Set(settings.company.clone()),
                    email: Set(settings.email.clone()),
                    phone: Set(settings.phone.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
            }
        }

        let mut saved = settings.clone();
        saved.id = id;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    #[tokio::test]
    async fn save_then_load_by_device() {
        let db = setup_test_db().await;
        let service = ProfileService::new(db);

        let saved = service
            .save(&UserSettings {
                device_id: "dev-1".to_string(),
                full_name: "R. Inspector".to_string(),
                title: "Resident Inspector".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!saved.id.is_empty());

        let loaded = service.load("dev-1").await.unwrap();
        assert_eq!(loaded.full_name, "R. Inspector");
        assert!(service.load("dev-2").await.is_none());
    }
}
