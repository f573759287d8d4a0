use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::filter::FilterError;
use crate::types::Collection;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate value for {collection}.{field}")]
    UniqueViolation { collection: Collection, field: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] FilterError),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Translate a unique-index violation reported by Postgres.
    ///
    /// Constraint names follow the default `<table>_<column>_key` convention.
    pub fn from_sqlx(collection: Collection, error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = error {
            if db.code().as_deref() == Some("23505") {
                let field = db
                    .constraint()
                    .map(|name| {
                        name.strip_prefix(&format!("{}_", collection.table_name()))
                            .unwrap_or(name)
                            .trim_end_matches("_key")
                            .to_string()
                    })
                    .unwrap_or_else(|| "unknown".to_string());
                return DatabaseError::UniqueViolation { collection, field };
            }
        }
        DatabaseError::Sqlx(error)
    }
}

/// Process-wide connection pool
pub struct DatabaseManager;

static MAIN_POOL: OnceCell<PgPool> = OnceCell::const_new();

impl DatabaseManager {
    /// Open a new pool from explicit settings
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max_connections={})", config.max_connections);
        Ok(pool)
    }

    /// Get the shared pool, creating it on first use
    pub async fn main_pool() -> Result<PgPool, DatabaseError> {
        MAIN_POOL
            .get_or_try_init(|| Self::connect(&crate::config::config().database))
            .await
            .cloned()
    }

    /// Close the shared pool (e.g., on shutdown)
    pub async fn close_all() {
        if let Some(pool) = MAIN_POOL.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_requires_url() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
            enable_query_logging: false,
        };
        let result = DatabaseManager::connect(&config).await;
        assert!(matches!(result, Err(DatabaseError::ConfigMissing("DATABASE_URL"))));
    }
}
