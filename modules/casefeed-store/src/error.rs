use casefeed_common::CasefeedError;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

impl From<StoreError> for CasefeedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(e) => CasefeedError::StoreUnavailable(e.to_string()),
        }
    }
}
