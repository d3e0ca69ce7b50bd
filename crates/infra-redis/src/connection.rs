// Redis Connection Setup

use crate::extract_command::LuaPopCommand;
use drainq_core::error::{AppError, Result};
use drainq_core::port::{ExtractCommand, QueueClient};
use redis::aio::MultiplexedConnection;
use redis::RedisError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for establishing the connection and the initial PING
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// Keep the RedisError as the source; only the log line is classified
pub(crate) fn map_redis_error(err: RedisError) -> AppError {
    debug!(
        kind = ?err.kind(),
        timeout = err.is_timeout(),
        connection_dropped = err.is_connection_dropped(),
        connection_refused = err.is_connection_refusal(),
        "Redis command failed"
    );
    AppError::backend(err)
}

/// Redis-backed queue client
///
/// Wraps a multiplexed connection; clones share it. Dropping the last clone
/// closes the connection, the fetcher never does so itself.
#[derive(Clone, Debug)]
pub struct RedisQueue {
    conn: MultiplexedConnection,
}

impl RedisQueue {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Handle for issuing a command (cheap clone of the multiplexed connection)
    pub fn connection(&self) -> MultiplexedConnection {
        self.conn.clone()
    }
}

impl QueueClient for RedisQueue {
    fn default_extract_command() -> Arc<dyn ExtractCommand<Self>> {
        Arc::new(LuaPopCommand::new())
    }
}

/// Open a multiplexed connection and verify it with PING
///
/// # Errors
/// - AppError::Config if the URL cannot be parsed
/// - AppError::Backend if the server is unreachable
/// - AppError::DeadlineExceeded if connecting takes longer than CONNECT_TIMEOUT
pub async fn connect(url: &str) -> Result<RedisQueue> {
    let client =
        redis::Client::open(url).map_err(|e| AppError::Config(format!("invalid Redis URL: {}", e)))?;

    let mut conn = tokio::time::timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection())
        .await
        .map_err(|_| AppError::DeadlineExceeded)?
        .map_err(map_redis_error)?;

    let pong: String = tokio::time::timeout(CONNECT_TIMEOUT, redis::cmd("PING").query_async(&mut conn))
        .await
        .map_err(|_| AppError::DeadlineExceeded)?
        .map_err(map_redis_error)?;

    info!(reply = %pong, "Connected to Redis");
    Ok(RedisQueue::new(conn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_invalid_url() {
        let result = connect("not-a-redis-url").await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_unreachable_server() {
        // Port 1 is reserved (tcpmux) and never runs Redis
        let result = connect("redis://127.0.0.1:1/").await;
        let err = tokio_test::assert_err!(result);
        assert!(err.is_infrastructure(), "unexpected error: {:?}", err);
    }
}
