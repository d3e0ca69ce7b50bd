// drainq Infrastructure - Redis Adapter
// Implements: QueueClient, ExtractCommand (Lua pop loop, LPOP count), QueueWriter

mod connection;
mod extract_command;
mod queue_writer;

pub use connection::{connect, RedisQueue};
pub use extract_command::{CountedPopCommand, LuaPopCommand, DEFAULT_POP_SCRIPT};

// Note: redis::RedisError conversion is handled by map_redis_error
// due to Rust's orphan rules (cannot implement From<RedisError> for AppError here)
