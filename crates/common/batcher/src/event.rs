use clock::Timestamp;
use serde::Deserialize;
use serde::Serialize;

/// One cast observation, as forwarded to the sink.
///
/// The timestamp is the collector's receipt time in Unix-epoch milliseconds,
/// not an upstream timestamp.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CastEvent {
    pub fid: u64,
    pub timestamp: i64,
}

impl CastEvent {
    pub fn new(fid: u64, timestamp: i64) -> Self {
        CastEvent { fid, timestamp }
    }

    /// Builds the record for a cast authored by `fid` and observed at `received_at`.
    pub fn observed(fid: u64, received_at: Timestamp) -> Self {
        CastEvent {
            fid,
            timestamp: clock::unix_millis(received_at),
        }
    }
}
