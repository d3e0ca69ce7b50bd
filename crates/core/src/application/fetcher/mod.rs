// Fetcher - atomic batch pop + per-entry decode

mod builder;
pub mod constants;

pub use builder::FetcherBuilder;

use crate::domain::{validate_keys, Batch, FetchContext};
use crate::error::Result;
use crate::port::{ExtractCommand, Fetcher, QueueClient, Transcoder};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drains bounded batches from a queue and decodes them into `T`
///
/// Immutable after `FetcherBuilder::build`; share it across tasks with `Arc`.
/// Every fetch is one backend round trip followed by an in-process decode
/// loop. Entries that fail to decode are dropped: they have already left the
/// queue and are not re-queued.
pub struct QueueFetcher<T, C: QueueClient> {
    client: C,
    extract_command: Arc<dyn ExtractCommand<C>>,
    transcoder: Arc<dyn Transcoder<T>>,
    batch_size: usize,
}

impl<T, C: QueueClient> QueueFetcher<T, C> {
    pub fn builder() -> FetcherBuilder<T, C> {
        FetcherBuilder::new()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch one batch and report how many popped entries were dropped
    ///
    /// # Errors
    /// - AppError::Validation if `keys` is empty or its first key is blank
    /// - AppError::Backend if the extract command fails
    /// - AppError::Cancelled / AppError::DeadlineExceeded from `ctx`
    pub async fn fetch_batch(&self, ctx: &FetchContext, keys: &[String]) -> Result<Batch<T>> {
        let queue = validate_keys(keys)?;

        let raw = ctx
            .run(
                self.extract_command
                    .execute(&self.client, keys, self.batch_size),
            )
            .await?;

        Ok(self.decode_all(queue, raw))
    }

    fn decode_all(&self, queue: &str, mut raw: Vec<String>) -> Batch<T> {
        if raw.len() > self.batch_size {
            warn!(
                queue = %queue,
                returned = raw.len(),
                batch_size = self.batch_size,
                "Extract command returned more entries than requested, truncating"
            );
            raw.truncate(self.batch_size);
        }

        let popped = raw.len();
        let mut items = Vec::with_capacity(popped);
        for (position, entry) in raw.iter().enumerate() {
            match self.transcoder.decode(entry) {
                Ok(item) => items.push(item),
                Err(e) => {
                    // Entry is gone from the store; only its position is logged
                    warn!(queue = %queue, position, error = %e, "Dropping undecodable queue entry");
                }
            }
        }

        let skipped = popped - items.len();
        debug!(
            queue = %queue,
            popped,
            decoded = items.len(),
            skipped,
            "Fetched batch"
        );

        Batch {
            items,
            popped,
            skipped,
        }
    }
}

#[async_trait]
impl<T, C> Fetcher<T> for QueueFetcher<T, C>
where
    T: Send + 'static,
    C: QueueClient,
{
    async fn fetch(&self, ctx: &FetchContext, keys: &[String]) -> Result<Vec<T>> {
        self.fetch_batch(ctx, keys).await.map(Batch::into_items)
    }
}

#[cfg(test)]
mod tests {
    use super::constants::DEFAULT_BATCH_SIZE;
    use super::*;
    use crate::domain::cancel_channel;
    use crate::error::AppError;
    use crate::port::mocks::{InMemoryQueue, MockBehavior};
    use crate::port::{JsonTranscoder, TranscodeError};
    use serde::{Deserialize, Serialize};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::task::JoinSet;

    const QUEUE: &str = "fetcher.domain.com::test_tasks";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestTask {
        id: i64,
        data: String,
    }

    fn task(id: i64) -> TestTask {
        TestTask {
            id,
            data: format!("task{}", id),
        }
    }

    fn keys() -> Vec<String> {
        vec![QUEUE.to_string()]
    }

    fn push_tasks(queue: &InMemoryQueue, tasks: &[TestTask]) {
        let transcoder = JsonTranscoder::<TestTask>::new();
        queue.push_raw(QUEUE, tasks.iter().map(|t| transcoder.encode(t).unwrap()));
    }

    fn fetcher(queue: &InMemoryQueue, batch_size: usize) -> QueueFetcher<TestTask, InMemoryQueue> {
        QueueFetcher::builder()
            .client(queue.clone())
            .batch_size(batch_size)
            .build_json()
            .unwrap()
    }

    #[test]
    fn test_build_without_client_fails() {
        let result = FetcherBuilder::<TestTask, InMemoryQueue>::new()
            .batch_size(10)
            .build_json();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_build_without_transcoder_fails() {
        let result = FetcherBuilder::<TestTask, InMemoryQueue>::new()
            .client(InMemoryQueue::new())
            .build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_build_applies_default_batch_size() {
        let queue = InMemoryQueue::new();
        assert_eq!(fetcher(&queue, 0).batch_size(), DEFAULT_BATCH_SIZE);

        let unset: QueueFetcher<TestTask, _> =
            QueueFetcher::builder().client(queue.clone()).build_json().unwrap();
        assert_eq!(unset.batch_size(), 1000);

        assert_eq!(fetcher(&queue, 25).batch_size(), 25);
    }

    #[tokio::test]
    async fn test_fetch_returns_tasks_in_push_order() {
        let queue = InMemoryQueue::new();
        let tasks = vec![task(1), task(2), task(3)];
        push_tasks(&queue, &tasks);

        let fetched = fetcher(&queue, 0)
            .fetch(&FetchContext::background(), &keys())
            .await
            .unwrap();

        assert_eq!(fetched, tasks);
        assert!(queue.snapshot(QUEUE).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_empty_and_missing_queue() {
        let queue = InMemoryQueue::new();
        let fetcher = fetcher(&queue, 0);
        let ctx = FetchContext::background();

        let fetched = fetcher.fetch(&ctx, &keys()).await.unwrap();
        assert!(fetched.is_empty());

        let fetched = fetcher
            .fetch(&ctx, &["fetcher.domain.com::empty_list".to_string()])
            .await
            .unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_never_exceeds_batch_size() {
        let queue = InMemoryQueue::new();
        let tasks: Vec<TestTask> = (0..10).map(task).collect();
        push_tasks(&queue, &tasks);

        let fetcher = fetcher(&queue, 4);
        let ctx = FetchContext::background();

        let first = fetcher.fetch(&ctx, &keys()).await.unwrap();
        let second = fetcher.fetch(&ctx, &keys()).await.unwrap();
        let third = fetcher.fetch(&ctx, &keys()).await.unwrap();
        let fourth = fetcher.fetch(&ctx, &keys()).await.unwrap();

        assert_eq!(first, tasks[0..4]);
        assert_eq!(second, tasks[4..8]);
        assert_eq!(third, tasks[8..10]);
        assert!(fourth.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        let queue = InMemoryQueue::new();
        let transcoder = JsonTranscoder::<TestTask>::new();
        queue.push_raw(
            QUEUE,
            vec![
                "not json at all".to_string(),
                transcoder.encode(&task(1)).unwrap(),
                r#"{"id":"two","data":"wrong type"}"#.to_string(),
                transcoder.encode(&task(3)).unwrap(),
            ],
        );

        let fetcher = fetcher(&queue, 0);
        let batch = fetcher
            .fetch_batch(&FetchContext::background(), &keys())
            .await
            .unwrap();

        assert_eq!(batch.items, vec![task(1), task(3)]);
        assert_eq!(batch.popped, 4);
        assert_eq!(batch.skipped, 2);
        // Malformed entries are not re-queued
        assert!(queue.snapshot(QUEUE).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_then_valid_returns_only_valid() {
        let queue = InMemoryQueue::new();
        queue.push_raw(QUEUE, ["{broken"]);
        push_tasks(&queue, &[task(7)]);

        let fetched = fetcher(&queue, 0)
            .fetch(&FetchContext::background(), &keys())
            .await
            .unwrap();
        assert_eq!(fetched, vec![task(7)]);
    }

    #[tokio::test]
    async fn test_all_entries_malformed_is_not_an_error() {
        let queue = InMemoryQueue::new();
        queue.push_raw(QUEUE, ["a", "b", "c"]);

        let fetched = fetcher(&queue, 0)
            .fetch(&FetchContext::background(), &keys())
            .await;
        tokio_test::assert_ok!(&fetched);
        assert!(fetched.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_backend_returns_infrastructure_error() {
        let queue = InMemoryQueue::new();
        push_tasks(&queue, &[task(1)]);
        queue.close();

        let result = fetcher(&queue, 0)
            .fetch(&FetchContext::background(), &keys())
            .await;

        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, AppError::Backend(_)));
        assert!(err.is_infrastructure());
        assert_eq!(queue.snapshot(QUEUE).len(), 1);
    }

    #[tokio::test]
    async fn test_empty_keys_rejected_before_backend_call() {
        let queue = InMemoryQueue::new();
        let result = fetcher(&queue, 0)
            .fetch(&FetchContext::background(), &[])
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(queue.call_count(), 0);
    }

    #[tokio::test]
    async fn test_deadline_exceeded_returns_no_items() {
        let queue = InMemoryQueue::with_behavior(MockBehavior::Delay(Duration::from_secs(5)));
        push_tasks(&queue, &[task(1), task(2)]);

        let ctx = FetchContext::background().with_timeout(Duration::from_millis(20));
        let result = fetcher(&queue, 0).fetch(&ctx, &keys()).await;

        assert!(matches!(result, Err(AppError::DeadlineExceeded)));
        // The mock sleeps before popping, so nothing was removed
        assert_eq!(queue.snapshot(QUEUE).len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_returns_error() {
        let queue = InMemoryQueue::with_behavior(MockBehavior::Delay(Duration::from_secs(5)));
        push_tasks(&queue, &[task(1)]);

        let (handle, token) = cancel_channel();
        let ctx = FetchContext::background().with_cancel(token);
        let fetcher = fetcher(&queue, 0);
        let keys = keys();

        let (result, _) = tokio::join!(fetcher.fetch(&ctx, &keys), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        assert!(matches!(result, Err(AppError::Cancelled)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_never_overlap() {
        let queue = InMemoryQueue::new();
        let tasks: Vec<TestTask> = (0..500).map(task).collect();
        push_tasks(&queue, &tasks);

        let fetcher = Arc::new(fetcher(&queue, 7));
        let mut workers = JoinSet::new();
        for _ in 0..8 {
            let fetcher = fetcher.clone();
            workers.spawn(async move {
                let ctx = FetchContext::background();
                let mut seen = Vec::new();
                loop {
                    let batch = fetcher.fetch(&ctx, &keys()).await.unwrap();
                    if batch.is_empty() {
                        break;
                    }
                    assert!(batch.len() <= 7);
                    // Each batch is internally FIFO
                    assert!(batch.windows(2).all(|w| w[0].id < w[1].id));
                    seen.extend(batch.into_iter().map(|t| t.id));
                    tokio::task::yield_now().await;
                }
                seen
            });
        }

        let mut all_ids = Vec::new();
        while let Some(result) = workers.join_next().await {
            all_ids.extend(result.unwrap());
        }

        let unique: HashSet<i64> = all_ids.iter().copied().collect();
        assert_eq!(all_ids.len(), 500, "every task delivered exactly once");
        assert_eq!(unique.len(), 500, "no task delivered twice");
    }

    /// Accepts only `id:<n>` strings
    struct PrefixTranscoder;

    impl Transcoder<i64> for PrefixTranscoder {
        fn encode(&self, value: &i64) -> std::result::Result<String, TranscodeError> {
            Ok(format!("id:{}", value))
        }

        fn decode(&self, raw: &str) -> std::result::Result<i64, TranscodeError> {
            raw.strip_prefix("id:")
                .ok_or_else(|| {
                    TranscodeError::Decode(format!("missing prefix in {:?}", raw).into())
                })?
                .parse()
                .map_err(TranscodeError::decode)
        }
    }

    #[tokio::test]
    async fn test_custom_transcoder() {
        let queue = InMemoryQueue::new();
        queue.push_raw(QUEUE, ["id:1", "1", "id:x", "id:4"]);

        let fetcher: QueueFetcher<i64, _> = QueueFetcher::builder()
            .client(queue.clone())
            .transcoder(PrefixTranscoder)
            .build()
            .unwrap();

        let fetched = fetcher
            .fetch(&FetchContext::background(), &keys())
            .await
            .unwrap();
        assert_eq!(fetched, vec![1, 4]);
    }

    /// Payload with no serde impls, carried as a single decimal byte
    #[derive(Debug, PartialEq)]
    struct Opaque(u8);

    struct ByteCodec;

    impl Transcoder<Opaque> for ByteCodec {
        fn encode(&self, value: &Opaque) -> std::result::Result<String, TranscodeError> {
            Ok(value.0.to_string())
        }

        fn decode(&self, raw: &str) -> std::result::Result<Opaque, TranscodeError> {
            raw.parse().map(Opaque).map_err(TranscodeError::decode)
        }
    }

    #[tokio::test]
    async fn test_payload_without_serde() {
        let queue = InMemoryQueue::new();
        queue.push_raw(QUEUE, ["7", "256", "9"]);

        let fetcher = QueueFetcher::<Opaque, _>::builder()
            .client(queue.clone())
            .transcoder(ByteCodec)
            .build()
            .unwrap();

        let batch = fetcher
            .fetch_batch(&FetchContext::background(), &keys())
            .await
            .unwrap();
        assert_eq!(batch.items, vec![Opaque(7), Opaque(9)]);
        assert_eq!(batch.skipped, 1);

        let as_trait: Arc<dyn Fetcher<Opaque>> = Arc::new(fetcher);
        queue.push_raw(QUEUE, ["1"]);
        let fetched = as_trait
            .fetch(&FetchContext::background(), &keys())
            .await
            .unwrap();
        assert_eq!(fetched, vec![Opaque(1)]);
    }

    /// Records its arguments and serves a fixed reply
    struct RecordingCommand {
        calls: Arc<Mutex<Vec<(Vec<String>, usize)>>>,
        reply: Vec<String>,
    }

    #[async_trait]
    impl ExtractCommand<InMemoryQueue> for RecordingCommand {
        async fn execute(
            &self,
            _client: &InMemoryQueue,
            keys: &[String],
            max_count: usize,
        ) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push((keys.to_vec(), max_count));
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_custom_command_receives_keys_and_batch_size() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let transcoder = JsonTranscoder::<TestTask>::new();
        let command = RecordingCommand {
            calls: calls.clone(),
            reply: vec![transcoder.encode(&task(9)).unwrap()],
        };

        let fetcher: QueueFetcher<TestTask, _> = QueueFetcher::builder()
            .client(InMemoryQueue::new())
            .extract_command(command)
            .batch_size(3)
            .build_json()
            .unwrap();

        let keys = vec!["primary".to_string(), "secondary".to_string()];
        let fetched = fetcher
            .fetch(&FetchContext::background(), &keys)
            .await
            .unwrap();

        assert_eq!(fetched, vec![task(9)]);
        assert_eq!(calls.lock().unwrap().as_slice(), &[(keys, 3)]);
    }

    #[tokio::test]
    async fn test_oversized_command_reply_is_truncated() {
        let transcoder = JsonTranscoder::<TestTask>::new();
        let command = RecordingCommand {
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: (1..=5).map(|i| transcoder.encode(&task(i)).unwrap()).collect(),
        };

        let fetcher: QueueFetcher<TestTask, _> = QueueFetcher::builder()
            .client(InMemoryQueue::new())
            .extract_command(command)
            .batch_size(2)
            .build_json()
            .unwrap();

        let fetched = fetcher
            .fetch(&FetchContext::background(), &keys())
            .await
            .unwrap();
        assert_eq!(fetched, vec![task(1), task(2)]);
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let queue = InMemoryQueue::new();
        push_tasks(&queue, &[task(1)]);

        let fetcher: Arc<dyn Fetcher<TestTask>> = Arc::new(fetcher(&queue, 0));
        let fetched = fetcher
            .fetch(&FetchContext::background(), &keys())
            .await
            .unwrap();
        assert_eq!(fetched, vec![task(1)]);
    }
}
