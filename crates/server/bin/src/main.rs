//! Eventide server entry point.
//!
//! Wires the NATS, Redis and HTTP adapters into the choreography engine,
//! spawns the two bus consumers, and serves the administrative API until
//! a shutdown signal arrives.

mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use eventide_server_application::{
    ActionDispatcher, ChoreographyEngine, DedupPolicy, DeduplicationService, DlqPolicy,
    DlqService, WorkflowService,
};
use eventide_server_domain::{EventBus, KeyValueStore};
use eventide_server_infrastructure::http::ReqwestHttpClient;
use eventide_server_infrastructure::kv::RedisKvStore;
use eventide_server_infrastructure::messaging::{
    ensure_streams, DlqRetryConsumer, EventListener, NatsEventBus, RetryExecutor,
};
use eventide_server_infrastructure::repositories::InMemoryWorkflowRepository;
use eventide_server_interface::{router, AppState};
use eventide_shared::ConfigLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let env_file = PathBuf::from(".env");
    let loader = ConfigLoader::new(env_file.exists().then_some(env_file));
    let config = loader.load()?;

    info!("Starting Eventide server");

    // Transports
    let nats_client = async_nats::connect(&config.nats.url).await?;
    let jetstream = async_nats::jetstream::new(nats_client);
    ensure_streams(&jetstream, &config.topics).await?;
    info!(url = %config.nats.url, "Connected to NATS");

    let kv: Arc<dyn KeyValueStore> = Arc::new(RedisKvStore::connect(&config.redis.url).await?);
    info!(url = %config.redis.url, "Connected to Redis");

    let bus: Arc<dyn EventBus> = Arc::new(NatsEventBus::new(jetstream.clone()));
    let http_client = Arc::new(ReqwestHttpClient::new(Duration::from_secs(
        config.outbound_http.timeout_secs,
    ))?);

    // Services
    let repository = Arc::new(InMemoryWorkflowRepository::new());

    let dedup = DeduplicationService::new(
        kv,
        DedupPolicy {
            prefix: config.dedup.prefix.clone(),
            ttl: Duration::from_secs(config.dedup.ttl_secs),
            fail_open: config.dedup.fail_open,
        },
    );
    let dlq = DlqService::new(
        bus.clone(),
        DlqPolicy {
            retry_topic: config.topics.dlq.clone(),
            dead_topic: config.topics.dlq_dead.clone(),
            max_retries: config.dlq.max_retries,
        },
    );

    let engine = Arc::new(ChoreographyEngine::new(
        repository.clone(),
        ActionDispatcher::new(bus.clone(), http_client),
        dedup.clone(),
        dlq.clone(),
    ));
    let workflows = Arc::new(WorkflowService::new(repository));

    // Consumers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = EventListener::new(
        jetstream.clone(),
        engine.clone(),
        dlq.clone(),
        config.topics.events.clone(),
    );
    let listener_task = tokio::spawn(listener.run(shutdown_rx.clone()));

    let retry_consumer = DlqRetryConsumer::new(
        jetstream,
        RetryExecutor::new(bus, dedup, dlq, config.topics.events.clone()),
        config.topics.dlq.clone(),
        config.dlq.max_retries,
        config.dlq.base_delay_ms,
    );
    let retry_task = tokio::spawn(retry_consumer.run(shutdown_rx));

    // Admin API
    let app = router(AppState { workflows, engine });
    let tcp = tokio::net::TcpListener::bind(config.http_api.bind_address).await?;
    info!(address = %config.http_api.bind_address, "Admin API listening");

    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    // Drain consumers
    info!("Stopping consumers");
    let _ = shutdown_tx.send(true);

    for (name, task) in [("event-listener", listener_task), ("dlq-retry", retry_task)] {
        match tokio::time::timeout(Duration::from_secs(30), task).await {
            Ok(Ok(Ok(()))) => info!(task = name, "Consumer stopped"),
            Ok(Ok(Err(e))) => error!(task = name, error = %e, "Consumer exited with error"),
            Ok(Err(e)) => error!(task = name, error = %e, "Consumer task panicked"),
            Err(_) => warn!(task = name, "Consumer did not stop within the grace period"),
        }
    }

    info!("Eventide server stopped");
    Ok(())
}
