//! SQLite persistence: schema, enum converters and the asset repository.

pub mod asset_repository;
pub mod converters;

use anyhow::{Context, Result};
use converters::{ColumnEnum, check_all_tables};
use sqlx::SqlitePool;

use crate::models::enums::{AssetType, AssetVendor, UpdateChannel};

const INIT_SQL: &str = include_str!("../../migrations/0001_init.sql");

/// Apply the embedded schema, one statement at a time.
pub async fn run_migrations(db: &SqlitePool) -> Result<()> {
    let statements = INIT_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}

/// Fail fast if the mapping tables are inconsistent or if any stored enum
/// column holds text that no variant maps to.
pub async fn validate_stored_enums(db: &SqlitePool) -> Result<()> {
    check_all_tables()?;
    check_column::<AssetVendor>(db).await?;
    check_column::<AssetType>(db).await?;
    check_column::<UpdateChannel>(db).await?;
    Ok(())
}

async fn check_column<T: ColumnEnum>(db: &SqlitePool) -> Result<()> {
    // COLUMN is a compile-time constant, never user input.
    let sql = format!("SELECT DISTINCT {} FROM assets", T::COLUMN);
    let values = sqlx::query_scalar::<_, String>(&sql)
        .fetch_all(db)
        .await
        .with_context(|| format!("scanning stored values of `{}`", T::COLUMN))?;

    for value in &values {
        T::from_column(value)?;
    }
    tracing::debug!("column `{}` holds {} known value(s)", T::COLUMN, values.len());
    Ok(())
}

/// Fresh in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn test_pool() -> std::sync::Arc<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("unable to create test database");
    run_migrations(&pool)
        .await
        .expect("unable to run migrations");
    std::sync::Arc::new(pool)
}
