// Extract Command Port (Interface)
// Atomic "pop up to N, stop when empty" primitive run by the backing store

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Batch extraction command
///
/// Implementations must execute as one indivisible operation with respect to
/// every other caller touching the same list, so that concurrent fetches
/// receive disjoint sets of entries.
///
/// Implementations:
/// - LuaPopCommand / CountedPopCommand (Redis)
/// - SqlitePopCommand (SQLite)
/// - mocks::InMemoryPopCommand (tests)
#[async_trait]
pub trait ExtractCommand<C>: Send + Sync
where
    C: Send + Sync,
{
    /// Pop at most `max_count` entries from the head of `keys[0]`, in pop order
    ///
    /// Returns an empty vector when the list is empty, missing, or
    /// `max_count` is zero.
    ///
    /// # Errors
    /// - AppError::Backend if the store cannot execute the command. The error
    ///   is never swallowed.
    async fn execute(&self, client: &C, keys: &[String], max_count: usize) -> Result<Vec<String>>;
}

/// Backing-store client handle
///
/// The handle is owned by the caller; fetchers only borrow it to run commands.
pub trait QueueClient: Send + Sync + Sized + 'static {
    /// Built-in pop loop used when no extract command is configured
    fn default_extract_command() -> Arc<dyn ExtractCommand<Self>>;
}
