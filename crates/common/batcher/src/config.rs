use std::time::Duration;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;
pub const DEFAULT_MAX_IDLE_MS: u64 = 5000;

/// Batching thresholds, fixed at construction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BatchConfig {
    pub(crate) max_batch_size: usize,
    pub(crate) max_batch_idle: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_batch_idle: Duration::from_millis(DEFAULT_MAX_IDLE_MS),
        }
    }
}

impl BatchConfig {
    /// Number of pending events that triggers an immediate flush.
    pub fn with_max_batch_size(self, max_batch_size: usize) -> Self {
        Self {
            max_batch_size,
            ..self
        }
    }

    /// Quiet period after the last add that triggers a flush.
    pub fn with_max_batch_idle(self, max_batch_idle: Duration) -> Self {
        Self {
            max_batch_idle,
            ..self
        }
    }
}
