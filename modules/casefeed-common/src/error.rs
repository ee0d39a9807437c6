use thiserror::Error;

/// Per-entity pipeline errors. Every variant is caught at the entity boundary
/// inside the cycle orchestrator and becomes a logged outcome; none of them
/// aborts the cycle or the process.
#[derive(Error, Debug)]
pub enum CasefeedError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Malformed source data: {0}")]
    MalformedSource(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}
