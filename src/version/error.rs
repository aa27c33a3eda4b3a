use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("State store lock poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("App not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Failure that truncates a check cycle
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("State store failed: {0}")]
    Store(#[from] StoreError),
}
