use castfeed_collector::config::CollectorConfig;
use castfeed_collector::config::CollectorOpt;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let collector_opt = CollectorOpt::parse();

    let log_level = if collector_opt.debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    set_log_level(log_level);

    info!("{} starting", clap::crate_name!());

    let config = CollectorConfig::try_from(collector_opt)?;
    castfeed_collector::run(config).await
}

/// Initialize a `tracing_subscriber`
///
/// Reports all the log events sent either with the `log` crate or the `tracing` crate.
///
/// If `RUST_LOG` is set, the log level filter is taken from this environment variable.
fn set_log_level(log_level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339());

    if std::env::var("RUST_LOG").is_ok() {
        subscriber
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    } else {
        subscriber.with_max_level(log_level).init();
    }
}
