// Domain Layer - Pure types shared by ports and services

pub mod batch;
pub mod context;
pub mod queue;

// Re-exports
pub use batch::Batch;
pub use context::{cancel_channel, CancelHandle, CancelToken, FetchContext};
pub use queue::{validate_keys, QueueKey};
