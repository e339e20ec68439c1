use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed platform response: {0}")]
    DataShape(String),

    #[error("Platform call failed: {0}")]
    ExternalCall(String),

    #[error("Platform call timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ActivityError>;
