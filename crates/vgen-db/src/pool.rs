//! Connection pool setup.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::{DbError, DbResult};

/// Connect to Postgres using `DATABASE_URL`.
pub async fn connect_from_env() -> DbResult<PgPool> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| DbError::config("DATABASE_URL not set"))?;

    let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await?;

    info!(max_connections, "Connected to Postgres");
    Ok(pool)
}
