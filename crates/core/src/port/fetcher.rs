// Fetcher Port

use crate::domain::FetchContext;
use crate::error::Result;
use async_trait::async_trait;

/// Pulls a bounded batch of tasks from a data source
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    /// Fetch tasks from the queue identified by `keys`
    ///
    /// An empty vector is a valid result. Entries that cannot be decoded are
    /// dropped silently; only infrastructure failures are errors.
    async fn fetch(&self, ctx: &FetchContext, keys: &[String]) -> Result<Vec<T>>;
}
