// Publisher gateway. Topic derivation and payload serialization live here;
// the actual transport sits behind the PublishBackend trait. The gateway
// never retries: a failed delivery leaves today's stored record untouched,
// so the next cycle re-detects the same change and tries again.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use casefeed_common::{CasefeedError, ChangeEvent};

#[async_trait]
pub trait PublishBackend: Send + Sync {
    /// Hand one serialized event to the transport. Returning `Ok` confirms
    /// the handoff; only then may the caller persist the snapshot.
    async fn deliver(
        &self,
        topic: &str,
        payload: &str,
        qos: u8,
        retain: bool,
    ) -> anyhow::Result<()>;
}

#[async_trait]
impl<B: PublishBackend + ?Sized> PublishBackend for std::sync::Arc<B> {
    async fn deliver(
        &self,
        topic: &str,
        payload: &str,
        qos: u8,
        retain: bool,
    ) -> anyhow::Result<()> {
        (**self).deliver(topic, payload, qos, retain).await
    }
}

/// POSTs events to a broker's HTTP publish endpoint. The broker must accept
/// topics it has never seen before.
pub struct HttpBridge {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpBridge {
    pub fn new(endpoint: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }
}

#[async_trait]
impl PublishBackend for HttpBridge {
    async fn deliver(
        &self,
        topic: &str,
        payload: &str,
        qos: u8,
        retain: bool,
    ) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "topic": topic,
            "payload": payload,
            "qos": qos,
            "retain": retain,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("broker returned status {status}: {message}");
        }
        Ok(())
    }
}

/// Accepts and discards events. Used when no broker is configured; handoff
/// still counts as confirmed, so snapshots keep getting persisted.
pub struct NoopBackend;

#[async_trait]
impl PublishBackend for NoopBackend {
    async fn deliver(
        &self,
        topic: &str,
        _payload: &str,
        _qos: u8,
        _retain: bool,
    ) -> anyhow::Result<()> {
        debug!(topic, "No broker configured, event discarded");
        Ok(())
    }
}

pub struct PublisherGateway {
    backend: Box<dyn PublishBackend>,
    topic_prefix: String,
    qos: u8,
    retain: bool,
}

impl PublisherGateway {
    pub fn new(backend: Box<dyn PublishBackend>, topic_prefix: &str, qos: u8, retain: bool) -> Self {
        Self {
            backend,
            topic_prefix: topic_prefix.trim_end_matches('/').to_string(),
            qos,
            retain,
        }
    }

    /// Serialize the event and hand it to the backend under the entity's
    /// derived topic.
    pub async fn publish(&self, event: &ChangeEvent) -> Result<(), CasefeedError> {
        let topic = self.topic_for(&event.data.country);
        let payload = serde_json::to_string(event)
            .map_err(|e| CasefeedError::Delivery(format!("payload serialization: {e}")))?;

        self.backend
            .deliver(&topic, &payload, self.qos, self.retain)
            .await
            .map_err(|e| CasefeedError::Delivery(e.to_string()))
    }

    /// `{prefix}/{TitleCasedEntity}`. Topics are case-sensitive at the
    /// transport; title-casing makes the address deterministic regardless of
    /// how the registry spells the entity.
    pub fn topic_for(&self, entity_id: &str) -> String {
        format!("{}/{}", self.topic_prefix, title_case(entity_id))
    }
}

/// Uppercase every letter that follows a non-letter, lowercase the rest.
/// "north macedonia" -> "North Macedonia", "guinea-bissau" -> "Guinea-Bissau".
fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut boundary = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if boundary {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            result.push(c);
            boundary = true;
        }
    }
    result
}
