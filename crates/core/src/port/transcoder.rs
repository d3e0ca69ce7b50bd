// Transcoder Port
// Bidirectional conversion between a task value and its stored string form

use crate::error::BoxError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use thiserror::Error;

/// Codec errors
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Encoding error: {0}")]
    Encode(#[source] BoxError),

    #[error("Decoding error: {0}")]
    Decode(#[source] BoxError),
}

impl TranscodeError {
    pub fn encode<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TranscodeError::Encode(Box::new(err))
    }

    pub fn decode<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TranscodeError::Decode(Box::new(err))
    }
}

/// Transcoder trait
///
/// Implementations must be stateless: one instance is shared by every
/// concurrent fetch. `decode` must exactly reverse `encode` for values
/// produced by the same transcoder.
pub trait Transcoder<T>: Send + Sync {
    /// Convert a value into the string stored in the queue
    ///
    /// # Errors
    /// - TranscodeError::Encode if the value cannot be represented
    fn encode(&self, value: &T) -> Result<String, TranscodeError>;

    /// Rebuild a value from a string previously produced by `encode`
    ///
    /// # Errors
    /// - TranscodeError::Decode on malformed input or a type mismatch
    fn decode(&self, raw: &str) -> Result<T, TranscodeError>;
}

/// JSON transcoder (default)
///
/// Plain `serde_json` text, no compression. Works for any serde type.
pub struct JsonTranscoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonTranscoder<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonTranscoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonTranscoder<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonTranscoder<T> {}

impl<T> std::fmt::Debug for JsonTranscoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonTranscoder")
    }
}

impl<T> Transcoder<T> for JsonTranscoder<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<String, TranscodeError> {
        serde_json::to_string(value).map_err(TranscodeError::encode)
    }

    fn decode(&self, raw: &str) -> Result<T, TranscodeError> {
        serde_json::from_str(raw).map_err(TranscodeError::decode)
    }
}
