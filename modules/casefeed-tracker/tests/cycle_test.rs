//! End-to-end cycle tests: fake source and broker, fixed clock, real
//! in-memory SQLite store underneath.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use casefeed_common::CasefeedError;
use casefeed_store::SnapshotStore;
use casefeed_tracker::publish::{PublishBackend, PublisherGateway};
use casefeed_tracker::testing::{
    candidate, FailingBackend, FixedClock, QueuedSource, RecordingBackend,
};
use casefeed_tracker::{EntityOutcome, Tracker};

fn utc(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

async fn test_store() -> SnapshotStore {
    let store = SnapshotStore::connect_in_memory()
        .await
        .expect("in-memory store");
    store.migrate().await.expect("migrations");
    store
}

fn tracker_with(
    store: SnapshotStore,
    source: QueuedSource,
    backend: Box<dyn PublishBackend>,
    clock: Arc<FixedClock>,
    entities: &[&str],
) -> Tracker {
    Tracker::new(
        store,
        Arc::new(source),
        PublisherGateway::new(backend, "COVID19", 0, true),
        clock,
        chrono_tz::Europe::Bratislava,
        entities.iter().map(|e| e.to_string()).collect(),
        4,
    )
}

// ---------------------------------------------------------------------------
// Scenario 1: cold start — empty history, first observation publishes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cold_start_publishes_raw_metrics_as_deltas() {
    let store = test_store().await;
    let backend = Arc::new(RecordingBackend::new());
    let clock = Arc::new(FixedClock::at(utc("2020-04-01T13:00:02Z")));

    let source = QueuedSource::new().on_fetch(
        "Slovakia",
        candidate("Slovakia", [107, 101, 4, 2], "2020-04-01T12:32:11Z"),
    );
    let tracker = tracker_with(
        store.clone(),
        source,
        Box::new(backend.clone()),
        clock,
        &["Slovakia"],
    );

    let report = tracker.run().await;
    assert_eq!(report.published, 1);

    let deliveries = backend.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].topic, "COVID19/Slovakia");
    assert_eq!(deliveries[0].qos, 0);
    assert!(deliveries[0].retain);

    let payload: serde_json::Value = serde_json::from_str(&deliveries[0].payload).unwrap();
    assert_eq!(payload["data"]["Country"], "Slovakia");
    assert_eq!(payload["data"]["Confirmed"], 107);
    assert_eq!(payload["data"]["Confirmed_delta"], "+107");
    assert_eq!(payload["data"]["Deaths_delta"], "+2");
    assert_eq!(payload["data"]["Last_Update"], "2020-04-01 14:32:11");
    assert_eq!(payload["published"], "2020-04-01 15:00:02");
    assert_eq!(payload["timezone"], "Europe/Bratislava");

    // The snapshot was persisted with the event's stamps.
    let stored = store
        .latest_on_date("Slovakia", "2020-04-01".parse().unwrap())
        .await
        .unwrap()
        .expect("persisted snapshot");
    assert_eq!(stored.confirmed, 107);
    assert_eq!(stored.last_update.to_string(), "2020-04-01 14:32:11");
    assert_eq!(stored.published.to_string(), "2020-04-01 15:00:02");
}

// ---------------------------------------------------------------------------
// Scenario 2: idempotent re-fetch — same metrics again, nothing emitted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refetching_identical_metrics_is_unchanged() {
    let store = test_store().await;
    let backend = Arc::new(RecordingBackend::new());
    let clock = Arc::new(FixedClock::at(utc("2020-04-01T13:00:02Z")));

    let source = QueuedSource::new()
        .on_fetch(
            "Slovakia",
            candidate("Slovakia", [107, 101, 4, 2], "2020-04-01T12:32:11Z"),
        )
        .on_fetch(
            "Slovakia",
            candidate("Slovakia", [107, 101, 4, 2], "2020-04-01T12:32:11Z"),
        );
    let tracker = tracker_with(
        store.clone(),
        source,
        Box::new(backend.clone()),
        clock,
        &["Slovakia"],
    );

    let first = tracker.run().await;
    assert_eq!(first.published, 1);

    let second = tracker.run().await;
    assert_eq!(second.published, 0);
    assert_eq!(second.unchanged, 1);

    // Exactly one delivery and one stored row across both cycles.
    assert_eq!(backend.deliveries().len(), 1);
    let row = store
        .latest_on_date("Slovakia", "2020-04-01".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.id, 1);
}

// ---------------------------------------------------------------------------
// Scenario 3: day boundary — deltas always relative to yesterday's record
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_day_deltas_stay_relative_to_yesterday() {
    let store = test_store().await;
    let backend = Arc::new(RecordingBackend::new());
    let clock = Arc::new(FixedClock::at(utc("2020-03-31T17:00:01Z")));

    let source = QueuedSource::new()
        .on_fetch(
            "Slovakia",
            candidate("Slovakia", [100, 96, 2, 2], "2020-03-31T16:02:44Z"),
        )
        .on_fetch(
            "Slovakia",
            candidate("Slovakia", [107, 101, 4, 2], "2020-04-01T12:32:11Z"),
        )
        .on_fetch(
            "Slovakia",
            candidate("Slovakia", [107, 101, 4, 2], "2020-04-01T12:32:11Z"),
        )
        .on_fetch(
            "Slovakia",
            candidate("Slovakia", [110, 104, 4, 2], "2020-04-01T15:45:30Z"),
        );
    let tracker = tracker_with(
        store.clone(),
        source,
        Box::new(backend.clone()),
        clock.clone(),
        &["Slovakia"],
    );

    // Yesterday's record lands first.
    let report = tracker.run().await;
    assert_eq!(report.published, 1);

    // Day rolls over; first observation of the new day.
    clock.set(utc("2020-04-01T13:00:02Z"));
    let report = tracker.run().await;
    assert_eq!(report.published, 1);
    let payload: serde_json::Value =
        serde_json::from_str(&backend.deliveries()[1].payload).unwrap();
    assert_eq!(payload["data"]["Confirmed_delta"], "+7");
    assert_eq!(payload["data"]["Active_delta"], "+5");

    // Same values again within the day: nothing to report.
    clock.set(utc("2020-04-01T14:00:02Z"));
    let report = tracker.run().await;
    assert_eq!(report.unchanged, 1);
    assert_eq!(backend.deliveries().len(), 2);

    // A later intra-day update: delta is against yesterday, not against the
    // morning's record.
    clock.set(utc("2020-04-01T16:00:02Z"));
    let report = tracker.run().await;
    assert_eq!(report.published, 1);
    let payload: serde_json::Value =
        serde_json::from_str(&backend.deliveries()[2].payload).unwrap();
    assert_eq!(payload["data"]["Confirmed_delta"], "+10");
    assert_eq!(payload["data"]["Active_delta"], "+8");
    assert_eq!(payload["data"]["Deaths_delta"], "+0");
}

// ---------------------------------------------------------------------------
// Scenario 4: delivery failure — nothing persisted, re-detected next cycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_delivery_is_retried_on_the_next_cycle() {
    let store = test_store().await;
    let clock = Arc::new(FixedClock::at(utc("2020-04-01T13:00:02Z")));

    let source = QueuedSource::new().on_fetch(
        "Slovakia",
        candidate("Slovakia", [107, 101, 4, 2], "2020-04-01T12:32:11Z"),
    );
    let tracker = tracker_with(
        store.clone(),
        source,
        Box::new(FailingBackend),
        clock.clone(),
        &["Slovakia"],
    );

    let report = tracker.run().await;
    assert_eq!(report.delivery_failed, 1);
    assert_eq!(
        report.outcome_for("Slovakia"),
        Some(&EntityOutcome::DeliveryFailed)
    );

    // Nothing was appended, so the same change is still a change.
    assert!(store
        .latest_on_date("Slovakia", "2020-04-01".parse().unwrap())
        .await
        .unwrap()
        .is_none());

    let backend = Arc::new(RecordingBackend::new());
    let source = QueuedSource::new().on_fetch(
        "Slovakia",
        candidate("Slovakia", [107, 101, 4, 2], "2020-04-01T12:32:11Z"),
    );
    let retry = tracker_with(
        store.clone(),
        source,
        Box::new(backend.clone()),
        clock,
        &["Slovakia"],
    );

    let report = retry.run().await;
    assert_eq!(report.published, 1);
    assert_eq!(backend.deliveries().len(), 1);
}

// ---------------------------------------------------------------------------
// Scenario 5: isolation — one entity's failure never blocks the others
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_failure_for_one_entity_does_not_block_others() {
    let store = test_store().await;
    let backend = Arc::new(RecordingBackend::new());
    let clock = Arc::new(FixedClock::at(utc("2020-04-01T13:00:02Z")));

    let source = QueuedSource::new()
        .on_fetch_error(
            "Slovakia",
            CasefeedError::Fetch("connection timed out".to_string()),
        )
        .on_fetch(
            "Austria",
            candidate("Austria", [9618, 8090, 1436, 92], "2020-04-01T12:10:00Z"),
        );
    let tracker = tracker_with(
        store.clone(),
        source,
        Box::new(backend.clone()),
        clock,
        &["Slovakia", "Austria"],
    );

    let report = tracker.run().await;
    assert_eq!(report.fetch_failed, 1);
    assert_eq!(report.published, 1);
    assert_eq!(
        report.outcome_for("Slovakia"),
        Some(&EntityOutcome::FetchFailed)
    );
    assert!(matches!(
        report.outcome_for("Austria"),
        Some(EntityOutcome::Published { .. })
    ));

    assert_eq!(backend.deliveries()[0].topic, "COVID19/Austria");
    assert!(store
        .latest_on_date("Austria", "2020-04-01".parse().unwrap())
        .await
        .unwrap()
        .is_some());
}

// ---------------------------------------------------------------------------
// Scenario 6: first observation of a day equal to yesterday's still publishes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_day_with_unchanged_values_publishes_zero_deltas() {
    let store = test_store().await;
    let backend = Arc::new(RecordingBackend::new());
    let clock = Arc::new(FixedClock::at(utc("2020-03-31T17:00:01Z")));

    let source = QueuedSource::new()
        .on_fetch(
            "Slovakia",
            candidate("Slovakia", [100, 96, 2, 2], "2020-03-31T16:02:44Z"),
        )
        .on_fetch(
            "Slovakia",
            candidate("Slovakia", [100, 96, 2, 2], "2020-04-01T08:00:00Z"),
        );
    let tracker = tracker_with(
        store.clone(),
        source,
        Box::new(backend.clone()),
        clock.clone(),
        &["Slovakia"],
    );

    tracker.run().await;

    clock.set(utc("2020-04-01T09:00:00Z"));
    let report = tracker.run().await;
    assert_eq!(report.published, 1);

    let payload: serde_json::Value =
        serde_json::from_str(&backend.deliveries()[1].payload).unwrap();
    assert_eq!(payload["data"]["Confirmed_delta"], "+0");
    assert_eq!(payload["data"]["Deaths_delta"], "+0");
}

// ---------------------------------------------------------------------------
// Scenario 7: all-zero cold start stays silent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_zero_first_observation_emits_nothing() {
    let store = test_store().await;
    let backend = Arc::new(RecordingBackend::new());
    let clock = Arc::new(FixedClock::at(utc("2020-04-01T13:00:02Z")));

    let source = QueuedSource::new().on_fetch(
        "Ukraine",
        candidate("Ukraine", [0, 0, 0, 0], "2020-04-01T12:00:00Z"),
    );
    let tracker = tracker_with(
        store.clone(),
        source,
        Box::new(backend.clone()),
        clock,
        &["Ukraine"],
    );

    let report = tracker.run().await;
    assert_eq!(report.unchanged, 1);
    assert!(backend.deliveries().is_empty());
}
