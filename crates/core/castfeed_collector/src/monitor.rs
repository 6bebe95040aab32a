//! Keeps a hub subscription alive and feeds merged casts to the batcher.

use crate::hub::HubClient;
use crate::hub::HubError;
use crate::hub::HubEventKind;
use crate::hub::HubEventStream;
use batcher::CastBatcher;
use batcher::CastEvent;
use clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use tracing::info;
use tracing::warn;

pub const RECONNECT_DELAY_SECS: u64 = 10;

pub struct FeedMonitor {
    hub: Arc<dyn HubClient>,
    batcher: CastBatcher,
    clock: Arc<dyn Clock>,
}

impl FeedMonitor {
    pub fn new(hub: Arc<dyn HubClient>, batcher: CastBatcher, clock: Arc<dyn Clock>) -> Self {
        FeedMonitor {
            hub,
            batcher,
            clock,
        }
    }

    /// Consumes the hub feed forever, resubscribing after any disconnection.
    pub async fn run(&self) {
        loop {
            match self.hub.subscribe(vec![HubEventKind::MergeMessage]).await {
                Ok(mut stream) => {
                    info!("Subscribed to the hub event feed");
                    let outcome = self.consume(stream.as_mut()).await;
                    stream.close().await;
                    match outcome {
                        Some(err) => error!(
                            "The hub event stream failed: {err}. Reconnecting in {}s",
                            RECONNECT_DELAY_SECS
                        ),
                        None => warn!(
                            "The hub event stream ended. Reconnecting in {}s",
                            RECONNECT_DELAY_SECS
                        ),
                    }
                }
                Err(err) => error!(
                    "Subscribing to the hub failed: {err}. Retrying in {}s",
                    RECONNECT_DELAY_SECS
                ),
            }
            tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)).await;
        }
    }

    /// Forwards cast observations until the stream ends or errors.
    async fn consume(&self, stream: &mut dyn HubEventStream) -> Option<HubError> {
        loop {
            match stream.next().await {
                Some(Ok(event)) => {
                    if let Some(fid) = event.cast_fid() {
                        let cast = CastEvent::observed(fid, self.clock.now());
                        self.batcher.add(cast).await;
                    }
                }
                Some(Err(err)) => return Some(err),
                None => return None,
            }
        }
    }
}
