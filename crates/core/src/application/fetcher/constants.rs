// Fetcher constants (no magic values)

/// Maximum number of entries popped by one fetch when none is configured
pub const DEFAULT_BATCH_SIZE: usize = 1000;
