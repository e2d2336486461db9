use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Application configuration, loaded from `sitelog.toml` with environment
/// overrides. Every field has a default so a missing file still yields a
/// usable local setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database path. `:memory:` is accepted for ephemeral stores.
    pub database_path: String,
    /// Public base URL prefixed to photo storage paths for display.
    pub storage_base_url: String,
    /// Webhook that turns captured notes into generated report content.
    pub refine_webhook_url: String,
    /// Quiet period after the last edit before an auto-save fires.
    pub save_debounce_ms: u64,
    /// Budget for local store reads that feed UI state.
    pub store_timeout_ms: u64,
    /// Budget for the refine webhook round trip.
    pub webhook_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "sitelog.db".to_string(),
            storage_base_url: String::new(),
            refine_webhook_url: String::new(),
            save_debounce_ms: 500,
            store_timeout_ms: 5_000,
            webhook_timeout_ms: 30_000,
        }
    }
}

impl AppConfig {
    /// Load configuration from the given file if it exists, then apply
    /// environment overrides (`SITELOG_DB`, `SITELOG_STORAGE_URL`,
    /// `SITELOG_WEBHOOK`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file {}", p.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("invalid config file {}", p.display()))?
            }
            _ => Self::default(),
        };

        if let Ok(db) = std::env::var("SITELOG_DB") {
            config.database_path = db;
        }
        if let Ok(url) = std::env::var("SITELOG_STORAGE_URL") {
            config.storage_base_url = url;
        }
        if let Ok(url) = std::env::var("SITELOG_WEBHOOK") {
            config.refine_webhook_url = url;
        }

        Ok(config)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_millis(self.webhook_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_local() {
        let config = AppConfig::default();
        assert_eq!(config.database_path, "sitelog.db");
        assert_eq!(config.save_debounce_ms, 500);
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str("database_path = \"field.db\"").unwrap();
        assert_eq!(config.database_path, "field.db");
        assert_eq!(config.webhook_timeout_ms, 30_000);
    }

    #[test]
    fn load_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitelog.toml");
        std::fs::write(&path, "storage_base_url = \"https://cdn.example.com\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.storage_base_url, "https://cdn.example.com");
        assert_eq!(config.save_debounce_ms, 500);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/sitelog.toml"))).unwrap();
        assert_eq!(config.store_timeout_ms, 5_000);
    }
}
