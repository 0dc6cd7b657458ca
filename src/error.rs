use thiserror::Error;

/// Main error type for the recommendation core
///
/// Note the taxonomy: gate rejections and unfillable slips are normal
/// domain outcomes and are NOT errors. Errors are reserved for genuine
/// faults: bad configuration, malformed model files, invalid slot tables.
#[derive(Error, Debug)]
pub enum SlipforgeError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid slot table: {0}")]
    SlotTable(String),

    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SlipforgeError
pub type Result<T> = std::result::Result<T, SlipforgeError>;
