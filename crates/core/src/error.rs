// Central Error Type for the Application

use thiserror::Error;

/// Boxed error used to carry backend and codec failures without losing their source
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The extraction command (or a producer push) failed inside the backing store.
    /// The original error is kept as the source.
    #[error("Backend error: {0}")]
    Backend(#[source] BoxError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Transcode error: {0}")]
    Transcode(#[from] crate::port::TranscodeError),
}

impl AppError {
    /// Wrap any backend error verbatim
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AppError::Backend(Box::new(err))
    }

    /// True for failures of the backing store or the caller's context
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::Backend(_) | AppError::Cancelled | AppError::DeadlineExceeded
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
