//! HTTP delivery of cast batches to the downstream sink.

use crate::error::CollectorError;
use async_trait::async_trait;
use batcher::BatchSink;
use batcher::CastEvent;
use batcher::SinkError;
use serde::Serialize;
use url::Url;

pub const BATCH_CASTS_PATH: &str = "api/batch-casts";

#[derive(Debug, Serialize)]
struct BatchCastsRequest<'a> {
    casts: &'a [CastEvent],
}

/// Posts each batch as one JSON request to the sink service.
///
/// Requests carry no timeout. A sink that accepts the connection but
/// never answers stalls the delivery and the batcher behind it.
pub struct HttpBatchSink {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpBatchSink {
    /// Resolves the delivery endpoint under the sink URL, keeping any path
    /// prefix the base carries.
    pub fn new(sink_url: &Url) -> Result<Self, CollectorError> {
        let mut base = sink_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let endpoint = base.join(BATCH_CASTS_PATH)?;
        let client = reqwest::Client::builder().build()?;
        Ok(HttpBatchSink { client, endpoint })
    }
}

#[async_trait]
impl BatchSink for HttpBatchSink {
    async fn send_batch(&self, events: &[CastEvent]) -> Result<(), SinkError> {
        let request = BatchCastsRequest { casts: events };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| SinkError::Unreachable {
                reason: err.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
