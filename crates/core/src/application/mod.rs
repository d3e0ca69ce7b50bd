// Application Layer - Use Cases

pub mod fetcher;
pub mod producer;

// Re-exports
pub use fetcher::{FetcherBuilder, QueueFetcher};
pub use producer::QueueProducer;
