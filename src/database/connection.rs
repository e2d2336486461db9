use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    // SQLite serialises writes; a small pool is all it can use
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    Database::connect(opt).await
}

pub fn get_database_url(database_path: &str) -> String {
    match database_path {
        ":memory:" => "sqlite::memory:".to_string(),
        path => format!("sqlite://{}?mode=rwc", path),
    }
}
