//! Serve mode — telemetry ingestion and the HTTP API in one process.
//!
//! 1. Load the worker file (fatal if missing, malformed, or empty)
//! 2. Pre-register every worker in the statistics store
//! 3. Spawn the ingestion loop against the REST proxy
//! 4. Serve the API until SIGINT/SIGTERM, then drain within a grace period

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use magnetar_api::{ApiState, build_router};
use magnetar_core::{LearnerConfig, load_worker_urls};
use magnetar_engine::Recommender;
use magnetar_sampler::RandomSource;
use magnetar_stats::StatsStore;
use magnetar_telemetry::{Ingestor, RestProxyConfig, RestProxySource};

/// Time allowed for in-flight requests and ingestion to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn run_serve(config: LearnerConfig) -> anyhow::Result<()> {
    info!("magnetar learner starting");

    // ── Worker pool ────────────────────────────────────────────

    let workers = load_worker_urls(&config.worker_config_path)?;
    let store = StatsStore::new();
    for worker in &workers {
        store.ensure(worker);
    }
    info!(
        count = workers.len(),
        path = %config.worker_config_path.display(),
        "workers registered"
    );

    // ── Decision core ──────────────────────────────────────────

    let recommender = Recommender::new(store.clone(), Arc::new(RandomSource::from_clock()));
    let ingestor = Ingestor::new(store.clone());
    let ingest_counters = ingestor.counters();

    // ── Telemetry ingestion ────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = RestProxySource::new(RestProxyConfig {
        brokers: config.kafka_brokers.clone(),
        topic: config.kafka_topic.clone(),
        group: config.kafka_group.clone(),
        poll_timeout: config.poll_timeout,
    });
    let ingest_shutdown = shutdown_rx.clone();
    let ingest_handle = tokio::spawn(async move {
        ingestor.run(source, ingest_shutdown).await;
    });

    // ── API server ─────────────────────────────────────────────

    let router = build_router(ApiState {
        store,
        recommender,
        ingest: ingest_counters,
    });
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(
        addr = %config.http_addr,
        brokers = %config.kafka_brokers.join(","),
        topic = %config.kafka_topic,
        "learner listening"
    );

    let mut server_shutdown = shutdown_rx.clone();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = server_shutdown.changed().await;
    });
    let mut server_handle = tokio::spawn(server.into_future());

    // ── Shutdown ───────────────────────────────────────────────

    tokio::select! {
        result = &mut server_handle => {
            warn!("API server exited before shutdown was requested");
            let _ = shutdown_tx.send(true);
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, ingest_handle).await;
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(SHUTDOWN_GRACE, &mut server_handle).await {
        Ok(result) => result??,
        Err(_) => {
            warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "in-flight requests did not drain; forcing shutdown"
            );
            server_handle.abort();
        }
    }

    if tokio::time::timeout(SHUTDOWN_GRACE, ingest_handle).await.is_err() {
        warn!("telemetry ingestion did not stop within grace period");
    }

    info!("magnetar learner stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
