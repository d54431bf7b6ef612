//! SQLite bootstrap for the case-management database.
//!
//! The schema migration is applied inline via `include_str!` on every open;
//! all of its statements are idempotent.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Schema for `users`, `clients`, `advocates`, `cases`, and `messages`.
pub const SCHEMA_SQL: &str = include_str!("../migrations/001_schema.sql");

/// Open (or create) the database at `path` and apply the schema.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the database
/// cannot be opened, or the migration fails.
pub async fn open_database(path: &Path, max_connections: u32) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create database directory {}", parent.display())
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .pragma("trusted_schema", "OFF")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    apply_schema(&pool).await?;
    info!(path = %path.display(), "database opened");
    Ok(pool)
}

/// Open a private in-memory database with the schema applied.
///
/// Uses a single connection that is never recycled, since every SQLite
/// `:memory:` connection is its own database.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the migration fails.
pub async fn open_in_memory() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .context("invalid in-memory database url")?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("failed to open in-memory database")?;

    apply_schema(&pool).await?;
    Ok(pool)
}

/// Apply [`SCHEMA_SQL`] to `pool`.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub async fn apply_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .context("failed to apply schema migration")?;
    Ok(())
}
