use crate::event::CastEvent;
use std::collections::VecDeque;

/// Upper bound on the events re-inserted after a failed delivery.
pub(crate) const MAX_REQUEUED_EVENTS: usize = 10;

/// The events accumulated since the last flush, in insertion order.
///
/// Repeated fids are kept as distinct entries.
#[derive(Debug, Default)]
pub(crate) struct PendingBatch {
    events: VecDeque<CastEvent>,
}

impl PendingBatch {
    pub fn new() -> Self {
        PendingBatch {
            events: VecDeque::new(),
        }
    }

    pub fn push(&mut self, event: CastEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Swaps the accumulated events out, leaving the batch empty.
    pub fn take_all(&mut self) -> Vec<CastEvent> {
        Vec::from(std::mem::take(&mut self.events))
    }

    /// Re-inserts an undelivered batch at the front, keeping at most the
    /// first `MAX_REQUEUED_EVENTS` of it. Returns the number of dropped events.
    pub fn requeue_front(&mut self, undelivered: Vec<CastEvent>) -> usize {
        let dropped = undelivered.len().saturating_sub(MAX_REQUEUED_EVENTS);
        for event in undelivered.into_iter().take(MAX_REQUEUED_EVENTS).rev() {
            self.events.push_front(event);
        }
        dropped
    }
}
