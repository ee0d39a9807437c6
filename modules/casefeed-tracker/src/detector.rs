// Change detection. One store pass fetches both baselines; the changed-check
// runs against today's latest record while deltas are computed against
// yesterday's, so a published delta always reflects day-over-day movement
// even when several updates land within the same day.

use chrono::NaiveDate;

use casefeed_common::{CasefeedError, MetricCounts, MetricDeltas, SnapshotCandidate};
use casefeed_store::SnapshotStore;

#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Changed { deltas: MetricDeltas },
    Unchanged,
}

pub struct ChangeDetector {
    store: SnapshotStore,
}

impl ChangeDetector {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }

    /// Decide whether `candidate` represents a real change as of `today`
    /// (the canonical-timezone calendar date of the current moment).
    pub async fn detect(
        &self,
        candidate: &SnapshotCandidate,
        today: NaiveDate,
    ) -> Result<Detection, CasefeedError> {
        let baseline_today = self
            .store
            .latest_on_date(&candidate.entity_id, today)
            .await
            .map_err(CasefeedError::from)?;
        let baseline_yesterday = self
            .store
            .latest_before_date(&candidate.entity_id, today)
            .await
            .map_err(CasefeedError::from)?;

        Ok(evaluate(
            &candidate.metrics,
            baseline_today.map(|s| s.metrics()),
            baseline_yesterday.map(|s| s.metrics()),
        ))
    }
}

/// Pure core of the detector.
///
/// The comparison reference is today's latest record; when absent, every
/// metric compares against 0, so the first observation of a calendar day is
/// always treated as changed (deltas may then legitimately render "+0").
/// Deltas are taken against yesterday's baseline, zeros when there is none.
pub fn evaluate(
    candidate: &MetricCounts,
    baseline_today: Option<MetricCounts>,
    baseline_yesterday: Option<MetricCounts>,
) -> Detection {
    let reference = baseline_today.unwrap_or_default();
    if *candidate == reference {
        return Detection::Unchanged;
    }

    let yesterday = baseline_yesterday.unwrap_or_default();
    Detection::Changed {
        deltas: MetricDeltas::between(candidate, &yesterday),
    }
}
