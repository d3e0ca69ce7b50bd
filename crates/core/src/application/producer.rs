// Producer - encodes tasks and appends them to a queue

use crate::error::{AppError, Result};
use crate::port::{JsonTranscoder, QueueWriter, Transcoder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Pushes encoded tasks to the tail of a queue
///
/// Use the same transcoder as the fetcher draining the queue.
pub struct QueueProducer<T, W> {
    writer: W,
    transcoder: Arc<dyn Transcoder<T>>,
}

impl<T, W: QueueWriter> QueueProducer<T, W> {
    pub fn new(writer: W, transcoder: Arc<dyn Transcoder<T>>) -> Self {
        Self { writer, transcoder }
    }

    /// Producer using the default JSON transcoder
    pub fn json(writer: W) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self::new(writer, Arc::new(JsonTranscoder::<T>::new()))
    }

    /// Encode every value, then push them in order
    ///
    /// Nothing is written if any value fails to encode.
    ///
    /// # Errors
    /// - AppError::Validation if `key` is empty
    /// - AppError::Transcode if a value cannot be encoded
    /// - AppError::Backend if the push fails
    pub async fn push(&self, key: &str, values: &[T]) -> Result<usize> {
        if key.is_empty() {
            return Err(AppError::Validation("queue key must not be empty".to_string()));
        }

        let entries = values
            .iter()
            .map(|value| self.transcoder.encode(value))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if entries.is_empty() {
            return self.writer.len(key).await;
        }

        let len = self.writer.push(key, &entries).await?;
        debug!(queue = %key, pushed = entries.len(), len, "Pushed entries");
        Ok(len)
    }

    pub async fn len(&self, key: &str) -> Result<usize> {
        self.writer.len(key).await
    }
}
