// Redis QueueWriter Implementation

use crate::connection::{map_redis_error, RedisQueue};
use async_trait::async_trait;
use drainq_core::error::Result;
use drainq_core::port::QueueWriter;

#[async_trait]
impl QueueWriter for RedisQueue {
    async fn push(&self, key: &str, entries: &[String]) -> Result<usize> {
        // RPUSH rejects an empty value list
        if entries.is_empty() {
            return self.len(key).await;
        }

        let mut conn = self.connection();
        let len: usize = redis::cmd("RPUSH")
            .arg(key)
            .arg(entries)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(len)
    }

    async fn len(&self, key: &str) -> Result<usize> {
        let mut conn = self.connection();
        let len: usize = redis::cmd("LLEN")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(len)
    }
}
