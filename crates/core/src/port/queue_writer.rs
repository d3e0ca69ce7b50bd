// Queue Writer Port (producer side)

use crate::error::Result;
use async_trait::async_trait;

/// Appends raw entries to the tail of a queue
#[async_trait]
pub trait QueueWriter: Send + Sync {
    /// Push entries in order, returning the queue length afterwards
    ///
    /// An empty `entries` slice writes nothing and reports the current length.
    async fn push(&self, key: &str, entries: &[String]) -> Result<usize>;

    /// Current number of entries in the queue (0 if it does not exist)
    async fn len(&self, key: &str) -> Result<usize>;
}
