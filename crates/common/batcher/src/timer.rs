use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// A cancellable one-shot timer running its action on a spawned task.
///
/// Cancellation wins whenever it races with the deadline, but an action that
/// has already started always runs to completion.
#[derive(Default)]
pub(crate) struct IdleTimer {
    cancel: Option<oneshot::Sender<()>>,
}

impl IdleTimer {
    pub fn new() -> Self {
        IdleTimer { cancel: None }
    }

    /// Drops any scheduled action, then schedules `action` to run after `delay`.
    pub fn arm<F>(&mut self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let deadline = Instant::now() + delay;
        let (cancel_tx, cancel_rx) = oneshot::channel();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_rx => {}
                () = tokio::time::sleep_until(deadline) => action.await,
            }
        });
        self.cancel = Some(cancel_tx);
    }

    /// Drops the scheduled action, unless it already started.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.cancel.is_some()
    }
}
