pub mod error;
mod migrate;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{SnapshotStore, StoredSnapshot};
