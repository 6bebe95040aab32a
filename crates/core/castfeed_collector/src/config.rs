use crate::error::CollectorError;
use batcher::BatchConfig;
use batcher::DEFAULT_MAX_BATCH_SIZE;
use batcher::DEFAULT_MAX_IDLE_MS;
use std::time::Duration;
use url::Url;

#[derive(Debug, clap::Parser)]
#[clap(
    name = clap::crate_name!(),
    version = clap::crate_version!(),
    about = clap::crate_description!()
)]
pub struct CollectorOpt {
    /// Turn-on the debug log level.
    ///
    /// If off only reports ERROR, WARN, and INFO
    /// If on also reports DEBUG and TRACE
    #[clap(long)]
    pub debug: bool,

    /// WebSocket URL of the hub event feed.
    #[clap(long, env = "CASTFEED_HUB_URL")]
    pub hub_url: Url,

    /// Bearer token expected by the hub.
    #[clap(long, env = "CASTFEED_HUB_AUTH_TOKEN", hide_env_values = true)]
    pub hub_auth_token: String,

    /// Base URL of the sink service receiving cast batches.
    #[clap(long, env = "CASTFEED_SINK_URL")]
    pub sink_url: Url,

    /// Casts per batch before an immediate flush.
    #[clap(long, env = "CASTFEED_MAX_BATCH_SIZE", default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,

    /// Idle milliseconds after the last cast before a flush.
    #[clap(long, env = "CASTFEED_MAX_BATCH_IDLE_MS", default_value_t = DEFAULT_MAX_IDLE_MS)]
    pub max_batch_idle_ms: u64,
}

/// Validated runtime settings assembled from the command line and environment.
#[derive(Debug)]
pub struct CollectorConfig {
    pub hub_url: Url,
    pub hub_auth_token: String,
    pub sink_url: Url,
    pub batch: BatchConfig,
}

impl TryFrom<CollectorOpt> for CollectorConfig {
    type Error = CollectorError;

    fn try_from(opt: CollectorOpt) -> Result<Self, Self::Error> {
        if opt.hub_auth_token.trim().is_empty() {
            return Err(CollectorError::EmptyAuthToken);
        }

        let batch = BatchConfig::default()
            .with_max_batch_size(opt.max_batch_size)
            .with_max_batch_idle(Duration::from_millis(opt.max_batch_idle_ms));

        Ok(CollectorConfig {
            hub_url: opt.hub_url,
            hub_auth_token: opt.hub_auth_token,
            sink_url: opt.sink_url,
            batch,
        })
    }
}
