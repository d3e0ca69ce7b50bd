// ============================================================================
// Mock Implementations for Testing
// ============================================================================

use super::{ExtractCommand, QueueClient, QueueWriter};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock store behavior
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Serve every command
    Healthy,
    /// Fail every command with message (simulates a dropped connection)
    Fail(String),
    /// Sleep before serving (for cancellation and deadline testing)
    Delay(Duration),
}

/// In-memory queue store
///
/// Clones share the same lists. A single mutex guards every list, so a pop
/// loop holding it is atomic with respect to other callers.
#[derive(Clone)]
pub struct InMemoryQueue {
    lists: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    behavior: Arc<Mutex<MockBehavior>>,
    call_count: Arc<Mutex<usize>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Healthy)
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            lists: Arc::new(Mutex::new(HashMap::new())),
            behavior: Arc::new(Mutex::new(behavior)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Make every following command fail as if the connection was closed
    pub fn close(&self) {
        self.set_behavior(MockBehavior::Fail("connection closed".to_string()));
    }

    /// Number of extract commands executed so far
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Append raw entries without going through a transcoder
    pub fn push_raw<I, S>(&self, key: &str, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lists = self.lists.lock().unwrap();
        let list = lists.entry(key.to_string()).or_default();
        list.extend(entries.into_iter().map(Into::into));
    }

    /// Snapshot of the entries still queued under `key`
    pub fn snapshot(&self, key: &str) -> Vec<String> {
        self.lists
            .lock()
            .unwrap()
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn apply_behavior(&self) -> Result<()> {
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            MockBehavior::Healthy => Ok(()),
            MockBehavior::Fail(msg) => Err(AppError::backend(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                msg,
            ))),
            MockBehavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    fn pop_batch(&self, key: &str, max_count: usize) -> Vec<String> {
        let mut lists = self.lists.lock().unwrap();
        let Some(list) = lists.get_mut(key) else {
            return Vec::new();
        };

        let mut popped = Vec::with_capacity(max_count.min(list.len()));
        for _ in 0..max_count {
            match list.pop_front() {
                Some(entry) => popped.push(entry),
                None => break,
            }
        }

        // Redis deletes a list once it is empty
        if list.is_empty() {
            lists.remove(key);
        }
        popped
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueClient for InMemoryQueue {
    fn default_extract_command() -> Arc<dyn ExtractCommand<Self>> {
        Arc::new(InMemoryPopCommand)
    }
}

/// Pop loop over an InMemoryQueue
pub struct InMemoryPopCommand;

#[async_trait]
impl ExtractCommand<InMemoryQueue> for InMemoryPopCommand {
    async fn execute(
        &self,
        client: &InMemoryQueue,
        keys: &[String],
        max_count: usize,
    ) -> Result<Vec<String>> {
        *client.call_count.lock().unwrap() += 1;
        client.apply_behavior().await?;

        let Some(key) = keys.first() else {
            return Ok(Vec::new());
        };
        Ok(client.pop_batch(key, max_count))
    }
}

#[async_trait]
impl QueueWriter for InMemoryQueue {
    async fn push(&self, key: &str, entries: &[String]) -> Result<usize> {
        self.apply_behavior().await?;
        let mut lists = self.lists.lock().unwrap();
        if entries.is_empty() {
            return Ok(lists.get(key).map_or(0, VecDeque::len));
        }
        let list = lists.entry(key.to_string()).or_default();
        list.extend(entries.iter().cloned());
        Ok(list.len())
    }

    async fn len(&self, key: &str) -> Result<usize> {
        self.apply_behavior().await?;
        Ok(self.lists.lock().unwrap().get(key).map_or(0, VecDeque::len))
    }
}
