// SQLite Queue Client & QueueWriter Implementation

use crate::extract_command::SqlitePopCommand;
use crate::{create_pool, run_migrations};
use async_trait::async_trait;
use drainq_core::error::{AppError, Result};
use drainq_core::port::{ExtractCommand, QueueClient, QueueWriter};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

// Keep the sqlx error as the source; only the log line is classified
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            let reason = match db_err.code().as_deref() {
                Some("5") => "database locked (SQLITE_BUSY)",
                Some("13") => "database or disk is full",
                Some("2067") | Some("1555") => "unique constraint violation",
                _ => "database error",
            };
            debug!(code = ?db_err.code(), reason, "SQLite statement failed");
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            debug!(error = %err, "SQLite pool unavailable");
        }
        _ => debug!(error = %err, "SQLite operation failed"),
    }
    AppError::backend(err)
}

/// SQLite-backed queue client
///
/// Clones share the pool. The fetcher never closes it.
#[derive(Clone)]
pub struct SqliteQueue {
    pool: SqlitePool,
}

impl SqliteQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the pool and bring the schema up to date
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl QueueClient for SqliteQueue {
    fn default_extract_command() -> Arc<dyn ExtractCommand<Self>> {
        Arc::new(SqlitePopCommand)
    }
}

#[async_trait]
impl QueueWriter for SqliteQueue {
    async fn push(&self, key: &str, entries: &[String]) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for entry in entries {
            sqlx::query("INSERT INTO queue_entries (queue_key, payload) VALUES (?, ?)")
                .bind(key)
                .bind(entry)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_entries WHERE queue_key = ?")
            .bind(key)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(len as usize)
    }

    async fn len(&self, key: &str) -> Result<usize> {
        let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_entries WHERE queue_key = ?")
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(len as usize)
    }
}
