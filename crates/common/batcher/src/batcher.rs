use crate::batch::PendingBatch;
use crate::config::BatchConfig;
use crate::event::CastEvent;
use crate::sink::BatchSink;
use crate::timer::IdleTimer;
use std::sync::Arc;
use std::sync::Mutex;
use tracing::error;
use tracing::warn;

/// Accumulates cast events and drives them to the sink in bounded batches.
///
/// A batch is flushed as soon as it holds `max_batch_size` events, or once
/// `max_batch_idle` has elapsed since the last add, whichever comes first.
/// Cheap to clone; all clones share the same pending batch.
#[derive(Clone)]
pub struct CastBatcher {
    inner: Arc<BatcherInner>,
}

struct BatcherInner {
    config: BatchConfig,
    sink: Arc<dyn BatchSink>,
    state: Mutex<BatcherState>,
    delivering: tokio::sync::Mutex<()>,
}

struct BatcherState {
    pending: PendingBatch,
    idle_timer: IdleTimer,
}

impl CastBatcher {
    pub fn new(config: BatchConfig, sink: Arc<dyn BatchSink>) -> Self {
        CastBatcher {
            inner: Arc::new(BatcherInner {
                config,
                sink,
                state: Mutex::new(BatcherState {
                    pending: PendingBatch::new(),
                    idle_timer: IdleTimer::new(),
                }),
                delivering: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Appends one event to the pending batch.
    ///
    /// Reaching the size threshold flushes right away and awaits the
    /// delivery. Any other add restarts the idle timer, whose flush runs on
    /// its own task.
    pub async fn add(&self, event: CastEvent) {
        let flush_now = {
            let mut state = self.inner.state.lock().unwrap();
            state.pending.push(event);
            if state.pending.len() >= self.inner.config.max_batch_size {
                state.idle_timer.cancel();
                true
            } else {
                let batcher = self.clone();
                state
                    .idle_timer
                    .arm(self.inner.config.max_batch_idle, async move {
                        batcher.flush().await;
                    });
                false
            }
        };

        if flush_now {
            self.flush().await;
        }
    }

    /// Delivers the pending batch, if any.
    ///
    /// The batch is swapped out before the sink call, so events added while a
    /// delivery is in flight accumulate into the next batch. On failure, at
    /// most the first ten events of the batch are re-inserted at the front of
    /// the pending batch and the rest are dropped; the survivors wait for the
    /// next size or idle trigger.
    pub async fn flush(&self) {
        let _delivering = self.inner.delivering.lock().await;

        let batch = {
            let mut state = self.inner.state.lock().unwrap();
            state.idle_timer.cancel();
            if state.pending.is_empty() {
                return;
            }
            state.pending.take_all()
        };

        if let Err(err) = self.inner.sink.send_batch(&batch).await {
            error!("Failed to deliver a batch of {} events: {err}", batch.len());
            let mut state = self.inner.state.lock().unwrap();
            let dropped = state.pending.requeue_front(batch);
            if dropped > 0 {
                warn!("Dropped {dropped} undelivered events exceeding the requeue limit");
            }
        }
    }

    /// Delivers whatever is pending before the process exits.
    pub async fn shutdown(&self) {
        self.flush().await;
    }
}
