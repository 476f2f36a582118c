// src/db/mod.rs

use std::{future::Future, time::Duration};

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{config::Config, error::ApiError};

pub async fn connect(config: &Config) -> anyhow::Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.query_timeout)
        .connect(&config.database_url)
        .await?;

    tracing::info!(max_connections = config.max_connections, "connected to PostgreSQL");
    Ok(pool)
}

/// Runs one database call under the per-query deadline.
pub async fn timed<T, F>(limit: Duration, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(ApiError::from),
        Err(_) => Err(ApiError::Timeout),
    }
}
