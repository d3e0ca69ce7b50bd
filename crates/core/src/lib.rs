// drainq Core - Fetch pipeline & Ports
// NO infrastructure dependencies: backing stores live in the infra crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{FetcherBuilder, QueueFetcher, QueueProducer};
pub use domain::{Batch, FetchContext};
pub use error::{AppError, Result};
pub use port::{Fetcher, JsonTranscoder, Transcoder};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
