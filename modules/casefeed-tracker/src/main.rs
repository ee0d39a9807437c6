use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arcgis_client::ArcgisClient;
use casefeed_common::{Config, SystemClock};
use casefeed_store::SnapshotStore;
use casefeed_tracker::publish::{HttpBridge, NoopBackend, PublishBackend, PublisherGateway};
use casefeed_tracker::registry;
use casefeed_tracker::source::ArcgisSource;
use casefeed_tracker::Tracker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("casefeed=info".parse()?))
        .init();

    info!("Casefeed tracker starting...");

    let config = Config::from_env();
    config.log_summary();

    let store = SnapshotStore::connect(&config.database_path).await?;
    store.migrate().await?;

    let client = match &config.source_base_url {
        Some(base_url) => ArcgisClient::with_base_url(base_url),
        None => ArcgisClient::new(),
    };

    let backend: Box<dyn PublishBackend> = match &config.broker_url {
        Some(url) => Box::new(HttpBridge::new(url, config.broker_token.as_deref())),
        None => Box::new(NoopBackend),
    };
    let gateway = PublisherGateway::new(
        backend,
        &config.topic_prefix,
        config.publish_qos,
        config.publish_retain,
    );

    let tracker = Tracker::new(
        store,
        Arc::new(ArcgisSource::new(client)),
        gateway,
        Arc::new(SystemClock),
        config.timezone,
        registry::registered_entities(&config),
        config.entity_fanout,
    );

    // One process invocation is one cycle; the scheduler owns the cadence.
    let report = tracker.run().await;
    info!("{report}");

    Ok(())
}
