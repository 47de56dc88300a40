// SPDX-License-Identifier: GPL-3.0-or-later
pub mod repositories;
pub mod sqlite_adapters;

use anyhow::Result;
use briefpress_config::AppConfig;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Open the SQLite pool for the configured database URL and apply migrations.
pub async fn init_database(config: &AppConfig) -> Result<SqlitePool> {
    info!(target: "store", "initializing database");

    // Normalize the database URL for SQLite on Windows
    let db_url = if config.database.url.starts_with("sqlite://")
        && !config.database.url.starts_with("sqlite://:memory:")
    {
        let db_path = config.database.url.trim_start_matches("sqlite://");
        let path = Path::new(db_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
                info!(target: "store", path = %parent.display(), "created database directory");
            }
        }

        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        // Forward slashes work on every platform SQLite supports
        let path_str = absolute_path.to_string_lossy().replace('\\', "/");

        format!("sqlite://{}?mode=rwc", path_str)
    } else {
        config.database.url.clone()
    };

    info!(target: "store", db_url = %db_url, "connecting to database");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.pool_max_size)
        .connect(&db_url)
        .await?;

    info!(target: "store", "running migrations");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    info!(target: "store", "database initialized successfully");
    Ok(pool)
}

pub use repositories::{JobRepository, PostRepository, SourceRepository, TriggerLogRepository};
pub use sqlite_adapters::{
    SqliteJobRepository, SqlitePostRepository, SqliteSourceRepository, SqliteTriggerLogRepository,
};
