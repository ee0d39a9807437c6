// Cycle orchestrator. One call to `run` is one full cycle: every registered
// entity goes through fetch → detect → build → publish → persist, with
// failures isolated at the entity boundary. The external scheduler owns the
// cadence; there is no loop in here.

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use casefeed_common::{CasefeedError, Clock};
use casefeed_store::SnapshotStore;

use crate::detector::{ChangeDetector, Detection};
use crate::event::EventBuilder;
use crate::publish::PublisherGateway;
use crate::report::{CycleReport, EntityOutcome};
use crate::source::StatsSource;

pub struct Tracker {
    store: SnapshotStore,
    source: Arc<dyn StatsSource>,
    detector: ChangeDetector,
    builder: EventBuilder,
    gateway: PublisherGateway,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    entities: Vec<String>,
    fanout: usize,
}

impl Tracker {
    pub fn new(
        store: SnapshotStore,
        source: Arc<dyn StatsSource>,
        gateway: PublisherGateway,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        entities: Vec<String>,
        fanout: usize,
    ) -> Self {
        Self {
            detector: ChangeDetector::new(store.clone()),
            builder: EventBuilder::new(timezone, clock.clone()),
            store,
            source,
            gateway,
            clock,
            timezone,
            entities,
            fanout,
        }
    }

    /// Run one full cycle. Never fails: every per-entity error becomes a
    /// logged outcome in the report.
    pub async fn run(&self) -> CycleReport {
        let today = self
            .clock
            .now_utc()
            .with_timezone(&self.timezone)
            .date_naive();

        info!(
            entities = self.entities.len(),
            %today,
            "Starting cycle"
        );

        // Entities fan out up to the configured limit; each entity's own
        // stage sequence stays strictly ordered inside its future.
        let results: Vec<(String, EntityOutcome)> =
            stream::iter(self.entities.iter().map(|entity| async move {
                let outcome = self.process_entity(entity, today).await;
                (entity.clone(), outcome)
            }))
            .buffer_unordered(self.fanout)
            .collect()
            .await;

        let mut report = CycleReport::default();
        for (entity, outcome) in results {
            report.record(entity, outcome);
        }
        report
    }

    async fn process_entity(&self, entity: &str, today: NaiveDate) -> EntityOutcome {
        match self.run_stages(entity, today).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(entity, error = %e, "Entity skipped for this cycle");
                match e {
                    CasefeedError::Fetch(_) => EntityOutcome::FetchFailed,
                    CasefeedError::MalformedSource(_) => EntityOutcome::MalformedSource,
                    CasefeedError::StoreUnavailable(_) => EntityOutcome::StoreUnavailable,
                    CasefeedError::Delivery(_) => EntityOutcome::DeliveryFailed,
                }
            }
        }
    }

    async fn run_stages(
        &self,
        entity: &str,
        today: NaiveDate,
    ) -> Result<EntityOutcome, CasefeedError> {
        self.store.ensure_entity(entity).await?;

        let candidate = self.source.fetch(entity).await?;

        let deltas = match self.detector.detect(&candidate, today).await? {
            Detection::Unchanged => return Ok(EntityOutcome::Unchanged),
            Detection::Changed { deltas } => deltas,
        };

        let event = self.builder.build(&candidate, &deltas);

        // A failed delivery leaves the history untouched; the next cycle
        // re-detects the same change and retries.
        self.gateway.publish(&event).await?;

        self.store.append(&event.to_snapshot()).await?;
        info!(entity, deltas = %deltas, "New data published");

        Ok(EntityOutcome::Published { deltas })
    }
}
