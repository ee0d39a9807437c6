use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArcgisError>;

#[derive(Debug, Error)]
pub enum ArcgisError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for ArcgisError {
    fn from(err: reqwest::Error) -> Self {
        ArcgisError::Network(err.to_string())
    }
}
