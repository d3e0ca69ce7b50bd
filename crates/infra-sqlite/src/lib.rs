// drainq Infrastructure - SQLite Adapter
// Implements: QueueClient, ExtractCommand, QueueWriter

mod connection;
mod extract_command;
mod migration;
mod queue;

pub use connection::create_pool;
pub use extract_command::SqlitePopCommand;
pub use migration::run_migrations;
pub use queue::SqliteQueue;

// Note: sqlx::Error conversion is handled by map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
