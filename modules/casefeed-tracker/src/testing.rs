// Test fakes for the tracker pipeline, matching the trait boundaries:
// QueuedSource (StatsSource), RecordingBackend / FailingBackend
// (PublishBackend), FixedClock (Clock). No network, no broker, real
// in-memory SQLite underneath.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use casefeed_common::{CasefeedError, Clock, MetricCounts, SnapshotCandidate};

use crate::publish::PublishBackend;
use crate::source::StatsSource;

/// Candidate with the given confirmed/active/recovered/deaths counts.
pub fn candidate(entity_id: &str, counts: [i64; 4], observed_at: &str) -> SnapshotCandidate {
    SnapshotCandidate {
        entity_id: entity_id.to_string(),
        metrics: MetricCounts {
            confirmed: counts[0],
            active: counts[1],
            recovered: counts[2],
            deaths: counts[3],
        },
        observed_at: observed_at.parse().expect("invalid RFC 3339 stamp"),
    }
}

// ---------------------------------------------------------------------------
// QueuedSource
// ---------------------------------------------------------------------------

/// Queue-based stats source. Each fetch pops the next queued response for
/// the entity; an empty queue is a fetch error, so a test that runs more
/// cycles than it queued responses fails loudly.
#[derive(Default)]
pub struct QueuedSource {
    responses: Mutex<HashMap<String, VecDeque<Result<SnapshotCandidate, CasefeedError>>>>,
}

impl QueuedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_fetch(self, entity_id: &str, candidate: SnapshotCandidate) -> Self {
        self.push(entity_id, Ok(candidate));
        self
    }

    pub fn on_fetch_error(self, entity_id: &str, error: CasefeedError) -> Self {
        self.push(entity_id, Err(error));
        self
    }

    fn push(&self, entity_id: &str, response: Result<SnapshotCandidate, CasefeedError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(entity_id.to_string())
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl StatsSource for QueuedSource {
    async fn fetch(&self, entity_id: &str) -> Result<SnapshotCandidate, CasefeedError> {
        self.responses
            .lock()
            .unwrap()
            .get_mut(entity_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(CasefeedError::Fetch(format!(
                    "QueuedSource: no response queued for '{entity_id}'"
                )))
            })
    }
}

// ---------------------------------------------------------------------------
// Publish backends
// ---------------------------------------------------------------------------

/// Records every delivered event and confirms the handoff.
#[derive(Default)]
pub struct RecordingBackend {
    deliveries: Mutex<Vec<Delivery>>,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub topic: String,
    pub payload: String,
    pub qos: u8,
    pub retain: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishBackend for RecordingBackend {
    async fn deliver(
        &self,
        topic: &str,
        payload: &str,
        qos: u8,
        retain: bool,
    ) -> anyhow::Result<()> {
        self.deliveries.lock().unwrap().push(Delivery {
            topic: topic.to_string(),
            payload: payload.to_string(),
            qos,
            retain,
        });
        Ok(())
    }
}

/// Rejects every delivery.
pub struct FailingBackend;

#[async_trait]
impl PublishBackend for FailingBackend {
    async fn deliver(
        &self,
        _topic: &str,
        _payload: &str,
        _qos: u8,
        _retain: bool,
    ) -> anyhow::Result<()> {
        anyhow::bail!("FailingBackend: broker unreachable")
    }
}

// ---------------------------------------------------------------------------
// FixedClock
// ---------------------------------------------------------------------------

/// Clock pinned to one instant, settable mid-test to cross day boundaries.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
