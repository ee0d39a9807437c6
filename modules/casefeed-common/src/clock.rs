use chrono::{DateTime, Utc};

/// Injected time source. "Today" for baseline selection and the `published`
/// stamp on events both derive from this, which keeps day-boundary behavior
/// deterministic under test.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
