// Fetcher Builder - validates dependencies and applies defaults

use super::constants::DEFAULT_BATCH_SIZE;
use super::QueueFetcher;
use crate::error::{AppError, Result};
use crate::port::{ExtractCommand, JsonTranscoder, QueueClient, Transcoder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Configuration for a QueueFetcher
///
/// | field | default |
/// |---|---|
/// | client | none, `build` fails |
/// | transcoder | none for `build`, `JsonTranscoder` for `build_json` |
/// | extract command | `C::default_extract_command()` |
/// | batch size | `DEFAULT_BATCH_SIZE` (1000), also used when set to 0 |
pub struct FetcherBuilder<T, C: QueueClient> {
    client: Option<C>,
    transcoder: Option<Arc<dyn Transcoder<T>>>,
    extract_command: Option<Arc<dyn ExtractCommand<C>>>,
    batch_size: usize,
}

impl<T, C: QueueClient> FetcherBuilder<T, C> {
    pub fn new() -> Self {
        Self {
            client: None,
            transcoder: None,
            extract_command: None,
            batch_size: 0,
        }
    }

    /// Backing-store handle (mandatory)
    pub fn client(mut self, client: C) -> Self {
        self.client = Some(client);
        self
    }

    pub fn transcoder(self, transcoder: impl Transcoder<T> + 'static) -> Self {
        self.shared_transcoder(Arc::new(transcoder))
    }

    /// Share one transcoder instance with a producer or other fetchers
    pub fn shared_transcoder(mut self, transcoder: Arc<dyn Transcoder<T>>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn extract_command(self, command: impl ExtractCommand<C> + 'static) -> Self {
        self.shared_extract_command(Arc::new(command))
    }

    pub fn shared_extract_command(mut self, command: Arc<dyn ExtractCommand<C>>) -> Self {
        self.extract_command = Some(command);
        self
    }

    /// Maximum entries per fetch; 0 selects the default
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Build a ready fetcher from an explicitly configured transcoder
    ///
    /// Places no bound on `T`, so payloads with their own codec work here.
    ///
    /// # Errors
    /// - AppError::Config if no client or no transcoder was supplied
    pub fn build(self) -> Result<QueueFetcher<T, C>> {
        let client = self
            .client
            .ok_or_else(|| AppError::Config("queue client is missing".to_string()))?;

        let transcoder = self.transcoder.ok_or_else(|| {
            AppError::Config("transcoder is missing (use build_json for JSON payloads)".to_string())
        })?;

        let extract_command = self
            .extract_command
            .unwrap_or_else(C::default_extract_command);

        let batch_size = if self.batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            self.batch_size
        };

        Ok(QueueFetcher {
            client,
            extract_command,
            transcoder,
            batch_size,
        })
    }

    /// Build a ready fetcher, defaulting to `JsonTranscoder` when no
    /// transcoder was supplied
    ///
    /// # Errors
    /// - AppError::Config if no client was supplied
    pub fn build_json(mut self) -> Result<QueueFetcher<T, C>>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        if self.transcoder.is_none() {
            self.transcoder = Some(Arc::new(JsonTranscoder::<T>::new()) as Arc<dyn Transcoder<T>>);
        }
        self.build()
    }
}

impl<T, C: QueueClient> Default for FetcherBuilder<T, C> {
    fn default() -> Self {
        Self::new()
    }
}
