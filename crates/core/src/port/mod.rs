// Port Layer - Interfaces for external dependencies

pub mod extract_command;
pub mod fetcher;
pub mod mocks;
pub mod queue_writer;
pub mod transcoder;

// Re-exports
pub use extract_command::{ExtractCommand, QueueClient};
pub use fetcher::Fetcher;
pub use queue_writer::QueueWriter;
pub use transcoder::{JsonTranscoder, TranscodeError, Transcoder};
