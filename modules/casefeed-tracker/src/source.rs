// Fetch seam. The tracker only depends on the StatsSource trait; the ArcGIS
// adapter validates the wire shape and produces a SnapshotCandidate, so
// malformed upstream data never reaches the detector.

use async_trait::async_trait;
use chrono::DateTime;

use arcgis_client::{ArcgisClient, CountryStats};
use casefeed_common::{CasefeedError, MetricCounts, SnapshotCandidate};

#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch the current observation for one entity.
    async fn fetch(&self, entity_id: &str) -> Result<SnapshotCandidate, CasefeedError>;
}

/// Adapts the ArcGIS statistics client to the fetch seam.
pub struct ArcgisSource {
    client: ArcgisClient,
}

impl ArcgisSource {
    pub fn new(client: ArcgisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatsSource for ArcgisSource {
    async fn fetch(&self, entity_id: &str) -> Result<SnapshotCandidate, CasefeedError> {
        let response = self
            .client
            .country_stats(entity_id)
            .await
            .map_err(|e| CasefeedError::Fetch(e.to_string()))?;

        if response.features.is_empty() {
            return Err(CasefeedError::MalformedSource(format!(
                "no statistics rows returned for '{entity_id}'"
            )));
        }

        // The query groups by country, so one matching row is expected.
        // Match case-insensitively; the source controls its own casing.
        let stats = response
            .features
            .iter()
            .map(|f| &f.attributes)
            .find(|attrs| {
                attrs
                    .country_region
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(entity_id))
            })
            .ok_or_else(|| {
                CasefeedError::MalformedSource(format!(
                    "no row matching '{entity_id}' in response"
                ))
            })?;

        candidate_from_stats(entity_id, stats)
    }
}

/// Validate one statistics row and build the candidate. The candidate's
/// `entity_id` is the registry identifier, not the source's display casing —
/// one identity flows through store keys, lookups, and topics.
fn candidate_from_stats(
    entity_id: &str,
    stats: &CountryStats,
) -> Result<SnapshotCandidate, CasefeedError> {
    let metrics = MetricCounts {
        confirmed: require_count(entity_id, "Confirmed", stats.confirmed)?,
        active: require_count(entity_id, "Active", stats.active)?,
        recovered: require_count(entity_id, "Recovered", stats.recovered)?,
        deaths: require_count(entity_id, "Deaths", stats.deaths)?,
    };

    let millis = stats.last_update.ok_or_else(|| {
        CasefeedError::MalformedSource(format!("missing Last_Update for '{entity_id}'"))
    })?;
    let observed_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        CasefeedError::MalformedSource(format!(
            "Last_Update {millis} out of range for '{entity_id}'"
        ))
    })?;

    Ok(SnapshotCandidate {
        entity_id: entity_id.to_string(),
        metrics,
        observed_at,
    })
}

fn require_count(entity_id: &str, name: &str, value: Option<i64>) -> Result<i64, CasefeedError> {
    match value {
        Some(v) if v >= 0 => Ok(v),
        Some(v) => Err(CasefeedError::MalformedSource(format!(
            "negative {name} count {v} for '{entity_id}'"
        ))),
        None => Err(CasefeedError::MalformedSource(format!(
            "missing {name} count for '{entity_id}'"
        ))),
    }
}
