use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

/// Failure reasons for the one write operation that surfaces feedback
/// to the user instead of being swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("invalid email address")]
    InvalidEmail,

    #[error("subscription failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
