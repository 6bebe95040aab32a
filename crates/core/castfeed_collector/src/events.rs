//! Envelopes received over the hub event feed.

use serde::Deserialize;
use thiserror::Error;

/// Event type announcing a message accepted by the hub.
pub const MERGE_MESSAGE_EVENT: &str = "MERGE_MESSAGE";

/// Message type of a cast, among the message kinds a hub merges.
pub const CAST_MESSAGE_TYPE: u8 = 1;

#[derive(Debug, Error)]
pub enum FeedEventError {
    #[error("Invalid hub event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// One event envelope from the hub feed.
///
/// Only the fields needed to recognize casts are deserialized,
/// everything else in the envelope is ignored.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct FeedEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub message: Option<MergedMessage>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct MergedMessage {
    #[serde(rename = "type")]
    pub message_type: u8,

    #[serde(default)]
    pub fid: Option<u64>,
}

impl FeedEvent {
    pub fn parse_from(payload: &str) -> Result<FeedEvent, FeedEventError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// The author fid, if this envelope carries a newly merged cast.
    pub fn cast_fid(&self) -> Option<u64> {
        if self.event_type != MERGE_MESSAGE_EVENT {
            return None;
        }
        match &self.message {
            Some(message) if message.message_type == CAST_MESSAGE_TYPE => message.fid,
            _ => None,
        }
    }
}
