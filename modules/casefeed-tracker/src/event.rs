use std::sync::Arc;

use chrono_tz::Tz;

use casefeed_common::{
    ChangeEvent, Clock, EventData, Metric, MetricDeltas, SnapshotCandidate,
};

/// Pure transform from a detected change to the published payload. Timezone
/// and clock are injected, so the wall-clock stamps are deterministic under
/// test, DST included.
pub struct EventBuilder {
    timezone: Tz,
    clock: Arc<dyn Clock>,
}

impl EventBuilder {
    pub fn new(timezone: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { timezone, clock }
    }

    /// Build the change event: the observed stamp converts from UTC into the
    /// canonical timezone and is stripped to wall-clock form; `published` is
    /// the current instant, converted the same way.
    pub fn build(&self, candidate: &SnapshotCandidate, deltas: &MetricDeltas) -> ChangeEvent {
        let last_update = candidate
            .observed_at
            .with_timezone(&self.timezone)
            .naive_local();
        let published = self
            .clock
            .now_utc()
            .with_timezone(&self.timezone)
            .naive_local();

        ChangeEvent {
            data: EventData {
                country: candidate.entity_id.clone(),
                confirmed: candidate.metrics.confirmed,
                active: candidate.metrics.active,
                recovered: candidate.metrics.recovered,
                deaths: candidate.metrics.deaths,
                confirmed_delta: deltas.render(Metric::Confirmed),
                active_delta: deltas.render(Metric::Active),
                recovered_delta: deltas.render(Metric::Recovered),
                deaths_delta: deltas.render(Metric::Deaths),
                last_update,
            },
            published,
            timezone: self.timezone.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedClock;
    use casefeed_common::MetricCounts;
    use chrono::{DateTime, Utc};

    fn utc(value: &str) -> DateTime<Utc> {
        value.parse().unwrap()
    }

    fn builder_at(now: &str) -> EventBuilder {
        EventBuilder::new(
            chrono_tz::Europe::Bratislava,
            Arc::new(FixedClock::at(utc(now))),
        )
    }

    fn candidate(observed_at: &str) -> SnapshotCandidate {
        SnapshotCandidate {
            entity_id: "Slovakia".to_string(),
            metrics: MetricCounts {
                confirmed: 107,
                active: 101,
                recovered: 4,
                deaths: 2,
            },
            observed_at: utc(observed_at),
        }
    }

    #[test]
    fn normalizes_observed_stamp_into_canonical_wall_clock() {
        // April: Bratislava is UTC+2 (CEST).
        let builder = builder_at("2020-04-01T13:00:02Z");
        let deltas = MetricDeltas::default();

        let event = builder.build(&candidate("2020-04-01T12:32:11Z"), &deltas);
        assert_eq!(event.data.last_update.to_string(), "2020-04-01 14:32:11");
        assert_eq!(event.published.to_string(), "2020-04-01 15:00:02");
        assert_eq!(event.timezone, "Europe/Bratislava");
    }

    #[test]
    fn winter_stamps_use_the_standard_offset() {
        // December: UTC+1 (CET).
        let builder = builder_at("2020-12-01T13:00:00Z");
        let deltas = MetricDeltas::default();

        let event = builder.build(&candidate("2020-12-01T12:32:11Z"), &deltas);
        assert_eq!(event.data.last_update.to_string(), "2020-12-01 13:32:11");
        assert_eq!(event.published.to_string(), "2020-12-01 14:00:00");
    }

    #[test]
    fn deltas_carry_their_rendered_signs() {
        let builder = builder_at("2020-04-01T13:00:02Z");
        let deltas = MetricDeltas {
            confirmed: 7,
            active: 5,
            recovered: 2,
            deaths: 0,
        };

        let event = builder.build(&candidate("2020-04-01T12:32:11Z"), &deltas);
        assert_eq!(event.data.confirmed_delta, "+7");
        assert_eq!(event.data.active_delta, "+5");
        assert_eq!(event.data.recovered_delta, "+2");
        assert_eq!(event.data.deaths_delta, "+0");
    }
}
