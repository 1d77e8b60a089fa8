//! magnetard — the Magnetar learner daemon.
//!
//! Single binary that assembles the learner:
//! - Worker statistics store, pre-seeded from the worker file
//! - Telemetry ingestion from the Kafka REST Proxy
//! - Thompson-sampling recommender
//! - HTTP API
//!
//! # Usage
//!
//! ```text
//! magnetard serve --worker-config config/workers.json --http-addr 0.0.0.0:8090
//! magnetard check-config --worker-config config/workers.json
//! ```

mod serve;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use magnetar_core::{LearnerConfig, load_worker_urls, split_and_trim};

#[derive(Parser)]
#[command(name = "magnetard", about = "Magnetar adaptive load-balancing learner", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest telemetry and serve recommendations.
    Serve {
        /// Comma-separated Kafka REST Proxy base URLs.
        #[arg(long, env = "LEARNER_KAFKA_BROKERS", default_value = "http://localhost:8082")]
        kafka_brokers: String,

        /// Topic carrying routing telemetry.
        #[arg(long, env = "LEARNER_KAFKA_TOPIC", default_value = "telemetry")]
        kafka_topic: String,

        /// Consumer group id.
        #[arg(long, env = "LEARNER_KAFKA_GROUP", default_value = "magnetar-learner")]
        kafka_group: String,

        /// Address for the HTTP API.
        #[arg(long, env = "LEARNER_HTTP_ADDR", default_value = "0.0.0.0:8090")]
        http_addr: SocketAddr,

        /// JSON file listing the worker pool (`{"workerUrls": [...]}`).
        #[arg(long, env = "LEARNER_WORKER_CONFIG", default_value = "../config/workers.json")]
        worker_config: PathBuf,

        /// Long-poll timeout for each stream read, in milliseconds.
        #[arg(long, env = "LEARNER_POLL_TIMEOUT_MS", default_value = "1000")]
        poll_timeout_ms: u64,
    },
    /// Validate a worker file and print the normalized worker list.
    CheckConfig {
        #[arg(long, env = "LEARNER_WORKER_CONFIG", default_value = "../config/workers.json")]
        worker_config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,magnetar=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            kafka_brokers,
            kafka_topic,
            kafka_group,
            http_addr,
            worker_config,
            poll_timeout_ms,
        } => {
            let config = LearnerConfig {
                kafka_brokers: split_and_trim(&kafka_brokers),
                kafka_topic,
                kafka_group,
                http_addr,
                worker_config_path: worker_config,
                poll_timeout: Duration::from_millis(poll_timeout_ms),
            };
            serve::run_serve(config).await
        }
        Command::CheckConfig { worker_config } => {
            let workers = load_worker_urls(&worker_config)?;
            println!("{}", serde_json::to_string_pretty(&workers)?);
            Ok(())
        }
    }
}
