// Redis Extract Commands

use crate::connection::{map_redis_error, RedisQueue};
use async_trait::async_trait;
use drainq_core::domain::validate_keys;
use drainq_core::error::Result;
use drainq_core::port::ExtractCommand;
use redis::{Script, Value};
use tracing::warn;

/// Pop loop executed server-side
///
/// Redis runs a script without interleaving other commands, so the whole
/// loop is atomic. `KEYS[1]` is drained; `ARGV[1]` is the maximum count.
pub const DEFAULT_POP_SCRIPT: &str = r#"
local key = KEYS[1]
local max_tasks = tonumber(ARGV[1])
local tasks = {}

for i = 1, max_tasks do
    local task = redis.call('LPOP', key)
    if not task then
        break
    end
    table.insert(tasks, task)
end

return tasks
"#;

/// Lua-script extract command (default for RedisQueue)
///
/// Runs via EVALSHA, loading the script on NOSCRIPT. Custom scripts get every
/// fetch key as `KEYS` and the batch size as `ARGV[1]`, and must return an
/// array of strings.
pub struct LuaPopCommand {
    script: Script,
}

impl LuaPopCommand {
    pub fn new() -> Self {
        Self::from_source(DEFAULT_POP_SCRIPT)
    }

    pub fn from_source(source: &str) -> Self {
        Self {
            script: Script::new(source),
        }
    }

    /// SHA1 of the script body
    pub fn hash(&self) -> &str {
        self.script.get_hash()
    }
}

impl Default for LuaPopCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractCommand<RedisQueue> for LuaPopCommand {
    async fn execute(
        &self,
        client: &RedisQueue,
        keys: &[String],
        max_count: usize,
    ) -> Result<Vec<String>> {
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let mut invocation = self.script.prepare_invoke();
        for key in keys {
            invocation.key(key);
        }
        invocation.arg(max_count);

        let mut conn = client.connection();
        let raw: Vec<Value> = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        Ok(into_strings(raw))
    }
}

/// Native `LPOP key count` (Redis >= 6.2)
///
/// A single command, so as atomic as the script. Only the first key is used.
pub struct CountedPopCommand;

#[async_trait]
impl ExtractCommand<RedisQueue> for CountedPopCommand {
    async fn execute(
        &self,
        client: &RedisQueue,
        keys: &[String],
        max_count: usize,
    ) -> Result<Vec<String>> {
        let key = validate_keys(keys)?;
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let mut conn = client.connection();
        // Nil reply when the list does not exist
        let raw: Option<Vec<Value>> = redis::cmd("LPOP")
            .arg(key)
            .arg(max_count)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        Ok(raw.map(into_strings).unwrap_or_default())
    }
}

// Only string elements can reach a string transcoder
fn into_strings(raw: Vec<Value>) -> Vec<String> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(position, value)| match value {
            Value::BulkString(bytes) => match String::from_utf8(bytes) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(position, error = %e, "Dropping non UTF-8 queue entry");
                    None
                }
            },
            Value::SimpleString(entry) => Some(entry),
            other => {
                warn!(position, reply = ?other, "Dropping non-string script reply element");
                None
            }
        })
        .collect()
}
