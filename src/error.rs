use thiserror::Error;

/// Main error type for the resolution engine
#[derive(Error, Debug)]
pub enum SettlerError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Ledger errors
    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Unknown ledger row: {0}")]
    UnknownRow(String),

    // Result sourcing errors
    #[error("Evidence provider error: {0}")]
    Sourcing(String),

    #[error("Score feed error: {0}")]
    ScoreFeed(String),

    // Grading errors
    #[error("Malformed bet record: {0}")]
    MalformedRecord(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SettlerError
pub type Result<T> = std::result::Result<T, SettlerError>;
