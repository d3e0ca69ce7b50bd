// Queue Domain Model

use crate::error::{AppError, Result};

/// Queue key (name of the backing list)
pub type QueueKey = String;

/// Ensure a fetch addresses at least one non-empty queue key
///
/// The built-in extract commands only drain `keys[0]`; any further keys are
/// forwarded untouched to custom commands.
pub fn validate_keys(keys: &[String]) -> Result<&str> {
    match keys.first() {
        Some(key) if !key.is_empty() => Ok(key.as_str()),
        Some(_) => Err(AppError::Validation("queue key must not be empty".to_string())),
        None => Err(AppError::Validation("at least one queue key is required".to_string())),
    }
}
