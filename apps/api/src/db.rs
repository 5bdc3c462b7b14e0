use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Schema for saved readings and zodiac profiles. Every statement is idempotent.
const SCHEMA_SQL: &str = include_str!("../migrations/0001_init.sql");

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies the bundled schema.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    pool.execute(SCHEMA_SQL)
        .await
        .context("applying database schema")?;
    info!("Database schema is up to date");
    Ok(())
}
