//! Kafka REST Proxy consumer.
//!
//! Joins a consumer group through the proxy's v2 JSON API and long-polls
//! for records:
//!
//! ```text
//! POST   {broker}/consumers/{group}          → { instance_id, base_uri }
//! POST   {base_uri}/subscription             { "topics": [topic] }
//! GET    {base_uri}/records?timeout=<ms>     → [{ "value": {...} }, ...]
//! DELETE {base_uri}                          (on close)
//! ```
//!
//! New instances start at the latest offset. Any failure discards the
//! instance and moves to the next configured broker; the following read
//! joins the group again.

use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{TelemetryError, TelemetryResult};
use crate::source::TelemetrySource;

const KAFKA_V2: &str = "application/vnd.kafka.v2+json";
const KAFKA_JSON_V2: &str = "application/vnd.kafka.json.v2+json";

/// Headroom on top of the long-poll timeout before a request is abandoned.
const REQUEST_SLACK: Duration = Duration::from_secs(5);

type HttpClient = Client<HttpConnector, Full<Bytes>>;

/// Connection settings for [`RestProxySource`].
#[derive(Debug, Clone)]
pub struct RestProxyConfig {
    /// Proxy base URLs, e.g. `http://localhost:8082`.
    pub brokers: Vec<String>,
    pub topic: String,
    pub group: String,
    pub poll_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CreatedConsumer {
    instance_id: String,
    base_uri: String,
}

#[derive(Debug, Deserialize)]
struct ConsumerRecord {
    #[serde(default)]
    value: serde_json::Value,
}

/// Telemetry source reading from a Kafka REST Proxy consumer group.
pub struct RestProxySource {
    config: RestProxyConfig,
    client: HttpClient,
    broker_idx: usize,
    /// `base_uri` of the joined consumer instance.
    instance: Option<String>,
    subscribed: bool,
    buffered: VecDeque<Vec<u8>>,
}

impl RestProxySource {
    pub fn new(config: RestProxyConfig) -> Self {
        Self {
            config,
            client: Client::builder(TokioExecutor::new()).build_http(),
            broker_idx: 0,
            instance: None,
            subscribed: false,
            buffered: VecDeque::new(),
        }
    }

    /// The broker the next join will use.
    pub fn current_broker(&self) -> TelemetryResult<&str> {
        self.config
            .brokers
            .get(self.broker_idx)
            .map(|b| b.trim_end_matches('/'))
            .ok_or(TelemetryError::NoEndpoints)
    }

    async fn join(&mut self) -> TelemetryResult<String> {
        let base_uri = match self.instance.clone() {
            Some(base_uri) if self.subscribed => return Ok(base_uri),
            // Created but the subscription never completed.
            Some(base_uri) => base_uri,
            None => self.create_instance().await?,
        };

        let subscription = serde_json::json!({ "topics": [self.config.topic] });
        if let Err(e) = self
            .send(
                Method::POST,
                &format!("{base_uri}/subscription"),
                KAFKA_V2,
                Some(subscription),
            )
            .await
        {
            self.instance = None;
            self.delete_instance(&base_uri).await;
            return Err(e);
        }
        self.subscribed = true;

        info!(
            %base_uri,
            topic = %self.config.topic,
            group = %self.config.group,
            "joined telemetry consumer group"
        );
        Ok(base_uri)
    }

    /// Create a consumer instance on the current broker. The instance is
    /// remembered before anything else is awaited so `close` can delete it.
    async fn create_instance(&mut self) -> TelemetryResult<String> {
        let broker = self.current_broker()?.to_string();
        let create = serde_json::json!({
            "name": instance_name(),
            "format": "json",
            "auto.offset.reset": "latest",
        });
        let body = self
            .send(
                Method::POST,
                &format!("{broker}/consumers/{}", self.config.group),
                KAFKA_V2,
                Some(create),
            )
            .await?;
        let created: CreatedConsumer = serde_json::from_slice(&body)?;
        let base_uri = created.base_uri.trim_end_matches('/').to_string();
        self.instance = Some(base_uri.clone());
        self.subscribed = false;
        debug!(%broker, instance = %created.instance_id, "created consumer instance");
        Ok(base_uri)
    }

    async fn poll(&mut self) -> TelemetryResult<Vec<Vec<u8>>> {
        let base_uri = self.join().await?;
        let uri = format!(
            "{base_uri}/records?timeout={}",
            self.config.poll_timeout.as_millis()
        );
        let body = self.send(Method::GET, &uri, KAFKA_JSON_V2, None).await?;
        let records: Vec<ConsumerRecord> = serde_json::from_slice(&body)?;
        if !records.is_empty() {
            debug!(count = records.len(), "fetched telemetry records");
        }
        records
            .into_iter()
            .map(|r| serde_json::to_vec(&r.value).map_err(TelemetryError::from))
            .collect()
    }

    /// Forget the current instance and rotate to the next broker.
    fn reset(&mut self) {
        self.instance = None;
        self.subscribed = false;
        if !self.config.brokers.is_empty() {
            self.broker_idx = (self.broker_idx + 1) % self.config.brokers.len();
        }
    }

    async fn delete_instance(&self, base_uri: &str) {
        if let Err(e) = self.send(Method::DELETE, base_uri, KAFKA_V2, None).await {
            debug!(error = %e, %base_uri, "consumer instance delete failed");
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        accept: &str,
        body: Option<serde_json::Value>,
    ) -> TelemetryResult<Bytes> {
        let parsed: Uri = uri
            .parse()
            .map_err(|e| TelemetryError::InvalidEndpoint(format!("{uri}: {e}")))?;

        let mut builder = Request::builder()
            .method(method)
            .uri(parsed)
            .header(ACCEPT, accept)
            .header("user-agent", "magnetar-learner/0.1");
        let payload = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, KAFKA_V2);
                Full::new(Bytes::from(serde_json::to_vec(&json)?))
            }
            None => Full::new(Bytes::new()),
        };
        let req = builder
            .body(payload)
            .map_err(|e| TelemetryError::InvalidEndpoint(format!("{uri}: {e}")))?;

        let deadline = self.config.poll_timeout + REQUEST_SLACK;
        let resp = tokio::time::timeout(deadline, self.client.request(req))
            .await
            .map_err(|_| TelemetryError::Transport(format!("{uri}: timed out after {deadline:?}")))?
            .map_err(|e| TelemetryError::Transport(format!("{uri}: {e}")))?;

        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| TelemetryError::Transport(format!("{uri}: {e}")))?
            .to_bytes();

        if !status.is_success() {
            return Err(TelemetryError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }
}

impl TelemetrySource for RestProxySource {
    async fn next_message(&mut self) -> TelemetryResult<Vec<u8>> {
        loop {
            if let Some(payload) = self.buffered.pop_front() {
                return Ok(payload);
            }
            match self.poll().await {
                Ok(records) => self.buffered.extend(records),
                Err(e) => {
                    self.reset();
                    return Err(e);
                }
            }
        }
    }

    async fn close(&mut self) {
        self.subscribed = false;
        if let Some(base_uri) = self.instance.take() {
            self.delete_instance(&base_uri).await;
            info!(%base_uri, "left telemetry consumer group");
        }
        if !self.buffered.is_empty() {
            warn!(count = self.buffered.len(), "discarding buffered telemetry on close");
            self.buffered.clear();
        }
    }
}

fn instance_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("magnetar-{}-{nanos}", std::process::id())
}
