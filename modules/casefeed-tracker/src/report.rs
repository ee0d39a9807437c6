use casefeed_common::MetricDeltas;

/// What happened to one entity during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    Published { deltas: MetricDeltas },
    Unchanged,
    FetchFailed,
    MalformedSource,
    StoreUnavailable,
    DeliveryFailed,
}

/// Summary of one full cycle across all registered entities.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub outcomes: Vec<(String, EntityOutcome)>,
    pub published: u32,
    pub unchanged: u32,
    pub fetch_failed: u32,
    pub malformed: u32,
    pub store_unavailable: u32,
    pub delivery_failed: u32,
}

impl CycleReport {
    pub fn record(&mut self, entity_id: String, outcome: EntityOutcome) {
        match outcome {
            EntityOutcome::Published { .. } => self.published += 1,
            EntityOutcome::Unchanged => self.unchanged += 1,
            EntityOutcome::FetchFailed => self.fetch_failed += 1,
            EntityOutcome::MalformedSource => self.malformed += 1,
            EntityOutcome::StoreUnavailable => self.store_unavailable += 1,
            EntityOutcome::DeliveryFailed => self.delivery_failed += 1,
        }
        self.outcomes.push((entity_id, outcome));
    }

    pub fn outcome_for(&self, entity_id: &str) -> Option<&EntityOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == entity_id)
            .map(|(_, outcome)| outcome)
    }
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Cycle Complete ===")?;
        writeln!(f, "Published:         {}", self.published)?;
        writeln!(f, "Unchanged:         {}", self.unchanged)?;
        writeln!(f, "Fetch failed:      {}", self.fetch_failed)?;
        writeln!(f, "Malformed source:  {}", self.malformed)?;
        writeln!(f, "Store unavailable: {}", self.store_unavailable)?;
        writeln!(f, "Delivery failed:   {}", self.delivery_failed)?;
        for (entity, outcome) in &self.outcomes {
            match outcome {
                EntityOutcome::Published { deltas } => {
                    writeln!(f, "  {entity}: published ({deltas})")?
                }
                EntityOutcome::Unchanged => writeln!(f, "  {entity}: unchanged")?,
                EntityOutcome::FetchFailed => writeln!(f, "  {entity}: fetch failed")?,
                EntityOutcome::MalformedSource => writeln!(f, "  {entity}: malformed source")?,
                EntityOutcome::StoreUnavailable => writeln!(f, "  {entity}: store unavailable")?,
                EntityOutcome::DeliveryFailed => writeln!(f, "  {entity}: delivery failed")?,
            }
        }
        Ok(())
    }
}
