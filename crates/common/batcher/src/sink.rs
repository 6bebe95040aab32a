use crate::event::CastEvent;
use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("The sink rejected the batch with status {status}")]
    Rejected { status: u16 },

    #[error("The sink could not be reached: {reason}")]
    Unreachable { reason: String },
}

#[automock]
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Delivers one batch. Re-delivery on failure is up to the caller.
    async fn send_batch(&self, events: &[CastEvent]) -> Result<(), SinkError>;
}
