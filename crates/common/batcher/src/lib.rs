//! Group cast events into bounded batches, flushed on size or idle-time.

mod batch;
mod batcher;
mod config;
mod event;
mod sink;
mod timer;

pub use crate::batcher::CastBatcher;
pub use crate::config::BatchConfig;
pub use crate::config::DEFAULT_MAX_BATCH_SIZE;
pub use crate::config::DEFAULT_MAX_IDLE_MS;
pub use crate::event::CastEvent;
pub use crate::sink::BatchSink;
pub use crate::sink::MockBatchSink;
pub use crate::sink::SinkError;
