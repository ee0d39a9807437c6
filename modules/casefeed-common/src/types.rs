use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Metrics ---

/// The fixed set of case counters tracked per entity. The pipeline iterates
/// `Metric::ALL` instead of naming individual counters; the storage schema and
/// the wire payload are the only other places the set is spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Confirmed,
    Active,
    Recovered,
    Deaths,
}

impl Metric {
    /// Deployment's metric set, in wire order.
    pub const ALL: [Metric; 4] = [
        Metric::Confirmed,
        Metric::Active,
        Metric::Recovered,
        Metric::Deaths,
    ];

    /// Wire and storage identifier.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed",
            Metric::Active => "Active",
            Metric::Recovered => "Recovered",
            Metric::Deaths => "Deaths",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One non-negative count per tracked metric. Non-negativity is enforced at
/// the fetch boundary, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricCounts {
    pub confirmed: i64,
    pub active: i64,
    pub recovered: i64,
    pub deaths: i64,
}

impl MetricCounts {
    pub fn get(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Active => self.active,
            Metric::Recovered => self.recovered,
            Metric::Deaths => self.deaths,
        }
    }
}

/// Signed day-over-day movement per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricDeltas {
    pub confirmed: i64,
    pub active: i64,
    pub recovered: i64,
    pub deaths: i64,
}

impl MetricDeltas {
    /// Movement from `baseline` to `current` for every metric.
    pub fn between(current: &MetricCounts, baseline: &MetricCounts) -> Self {
        Self {
            confirmed: current.confirmed - baseline.confirmed,
            active: current.active - baseline.active,
            recovered: current.recovered - baseline.recovered,
            deaths: current.deaths - baseline.deaths,
        }
    }

    pub fn get(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Active => self.active,
            Metric::Recovered => self.recovered,
            Metric::Deaths => self.deaths,
        }
    }

    /// Wire rendering. The sign is always explicit, zero included:
    /// `"+3"`, `"-1"`, `"+0"`.
    pub fn render(&self, metric: Metric) -> String {
        format!("{:+}", self.get(metric))
    }
}

impl std::fmt::Display for MetricDeltas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for metric in Metric::ALL {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{} {:+}", metric.name(), self.get(metric))?;
            first = false;
        }
        Ok(())
    }
}

// --- Observations ---

/// A fetched-but-not-yet-persisted observation for one entity.
/// `observed_at` is the source-reported instant, still in UTC; timezone
/// normalization happens when the event is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotCandidate {
    pub entity_id: String,
    pub metrics: MetricCounts,
    pub observed_at: DateTime<Utc>,
}

/// One persisted observation. `observed_at` is the source-reported instant in
/// canonical wall-clock form; `recorded_at` is the `published` stamp of the
/// event the snapshot was derived from. Source clocks may lag, so
/// `recorded_at >= observed_at` is not guaranteed and nothing may assume it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub entity_id: String,
    pub metrics: MetricCounts,
    pub observed_at: NaiveDateTime,
    pub recorded_at: NaiveDateTime,
}

// --- Change events ---

/// The published payload. Serializes to the canonical JSON shape:
///
/// ```json
/// {
///   "data": {
///     "Country": "Slovakia",
///     "Confirmed": 107, "Active": 101, "Recovered": 4, "Deaths": 2,
///     "Confirmed_delta": "+7", "Active_delta": "+5",
///     "Recovered_delta": "+2", "Deaths_delta": "+0",
///     "Last_Update": "2020-04-01 14:32:11"
///   },
///   "published": "2020-04-01 15:00:02",
///   "timezone": "Europe/Bratislava"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub data: EventData,
    #[serde(with = "wall_clock")]
    pub published: NaiveDateTime,
    pub timezone: String,
}

/// Inner `data` object of a change event. Field names match the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Confirmed")]
    pub confirmed: i64,
    #[serde(rename = "Active")]
    pub active: i64,
    #[serde(rename = "Recovered")]
    pub recovered: i64,
    #[serde(rename = "Deaths")]
    pub deaths: i64,
    #[serde(rename = "Confirmed_delta")]
    pub confirmed_delta: String,
    #[serde(rename = "Active_delta")]
    pub active_delta: String,
    #[serde(rename = "Recovered_delta")]
    pub recovered_delta: String,
    #[serde(rename = "Deaths_delta")]
    pub deaths_delta: String,
    #[serde(rename = "Last_Update", with = "wall_clock")]
    pub last_update: NaiveDateTime,
}

impl ChangeEvent {
    /// The snapshot to persist once this event's delivery is confirmed.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            entity_id: self.data.country.clone(),
            metrics: MetricCounts {
                confirmed: self.data.confirmed,
                active: self.data.active,
                recovered: self.data.recovered,
                deaths: self.data.deaths,
            },
            observed_at: self.data.last_update,
            recorded_at: self.published,
        }
    }
}

/// Serde adapter for the canonical wall-clock timestamp format.
pub mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(de)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn naive(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, wall_clock::FORMAT).unwrap()
    }

    fn sample_event() -> ChangeEvent {
        ChangeEvent {
            data: EventData {
                country: "Slovakia".to_string(),
                confirmed: 107,
                active: 101,
                recovered: 4,
                deaths: 2,
                confirmed_delta: "+7".to_string(),
                active_delta: "+5".to_string(),
                recovered_delta: "+2".to_string(),
                deaths_delta: "+0".to_string(),
                last_update: naive("2020-04-01 14:32:11"),
            },
            published: naive("2020-04-01 15:00:02"),
            timezone: "Europe/Bratislava".to_string(),
        }
    }

    #[test]
    fn deltas_render_with_explicit_sign_including_zero() {
        let deltas = MetricDeltas {
            confirmed: 5,
            active: -3,
            recovered: 0,
            deaths: 1,
        };
        assert_eq!(deltas.render(Metric::Confirmed), "+5");
        assert_eq!(deltas.render(Metric::Active), "-3");
        assert_eq!(deltas.render(Metric::Recovered), "+0");
        assert_eq!(deltas.render(Metric::Deaths), "+1");
    }

    #[test]
    fn deltas_between_subtracts_per_metric() {
        let current = MetricCounts {
            confirmed: 107,
            active: 101,
            recovered: 4,
            deaths: 2,
        };
        let baseline = MetricCounts {
            confirmed: 100,
            active: 103,
            recovered: 2,
            deaths: 2,
        };
        let deltas = MetricDeltas::between(&current, &baseline);
        assert_eq!(deltas.confirmed, 7);
        assert_eq!(deltas.active, -2);
        assert_eq!(deltas.recovered, 2);
        assert_eq!(deltas.deaths, 0);
    }

    #[test]
    fn metric_accessors_cover_the_full_set() {
        let counts = MetricCounts {
            confirmed: 1,
            active: 2,
            recovered: 3,
            deaths: 4,
        };
        let values: Vec<i64> = Metric::ALL.iter().map(|&m| counts.get(m)).collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
    }

    #[test]
    fn event_serializes_to_canonical_shape() {
        let value = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(
            value,
            json!({
                "data": {
                    "Country": "Slovakia",
                    "Confirmed": 107,
                    "Active": 101,
                    "Recovered": 4,
                    "Deaths": 2,
                    "Confirmed_delta": "+7",
                    "Active_delta": "+5",
                    "Recovered_delta": "+2",
                    "Deaths_delta": "+0",
                    "Last_Update": "2020-04-01 14:32:11"
                },
                "published": "2020-04-01 15:00:02",
                "timezone": "Europe/Bratislava"
            })
        );
    }

    #[test]
    fn event_round_trips_through_json() {
        let event = sample_event();
        let encoded = serde_json::to_string(&event).unwrap();
        let decoded: ChangeEvent = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn snapshot_derives_from_event_fields() {
        let event = sample_event();
        let snapshot = event.to_snapshot();
        assert_eq!(snapshot.entity_id, "Slovakia");
        assert_eq!(snapshot.metrics.confirmed, 107);
        assert_eq!(snapshot.metrics.deaths, 2);
        assert_eq!(snapshot.observed_at, naive("2020-04-01 14:32:11"));
        assert_eq!(snapshot.recorded_at, naive("2020-04-01 15:00:02"));
    }
}
