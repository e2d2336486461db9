use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::AppConfig;
use crate::database::connection::{establish_connection, get_database_url};
use crate::database::migrations::Migrator;
use crate::services::{
    AiCacheService, ArchiveService, DraftService, LocalStateService, PhotoService, ProfileService,
    ProjectService, RefineService, ReportService,
};
use crate::session::SaveDebouncer;

/// One connected application: the store handle plus constructors for every
/// service, wired with the configuration's timeouts and endpoints.
#[derive(Clone)]
pub struct AppContext {
    db: DatabaseConnection,
    config: AppConfig,
}

impl AppContext {
    /// Open (or create) the database, run migrations, and wrap it.
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let url = get_database_url(&config.database_path);
        let db = establish_connection(&url)
            .await
            .with_context(|| format!("failed to open store at {url}"))?;
        Migrator::up(&db, None)
            .await
            .context("failed to run store migrations")?;
        info!("store ready at {}", config.database_path);
        Ok(Self::new(db, config))
    }

    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self { db, config }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn local_state(&self) -> LocalStateService {
        LocalStateService::new(self.db.clone())
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.db.clone()).with_timeout(self.config.store_timeout())
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.db.clone()).with_timeout(self.config.store_timeout())
    }

    pub fn drafts(&self) -> DraftService {
        DraftService::new(self.db.clone())
    }

    pub fn photos(&self) -> PhotoService {
        PhotoService::new(self.db.clone())
    }

    pub fn ai_cache(&self) -> AiCacheService {
        AiCacheService::new(self.db.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.clone()).with_storage_base(self.config.storage_base_url.clone())
    }

    pub fn archives(&self) -> ArchiveService {
        ArchiveService::new(self.db.clone())
    }

    pub fn refine(&self) -> RefineService {
        RefineService::new(self.db.clone(), self.config.refine_webhook_url.clone())
            .with_timeout(self.config.webhook_timeout())
    }

    pub fn save_debouncer(&self) -> SaveDebouncer {
        SaveDebouncer::new(self.config.save_debounce())
    }
}
