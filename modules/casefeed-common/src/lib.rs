pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::CasefeedError;
pub use types::*;
