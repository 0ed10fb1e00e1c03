//! Error types for the hydramon service

/// Errors that can occur in the hydramon service
#[derive(Debug, thiserror::Error)]
pub enum HydramonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for hydramon operations
pub type Result<T> = std::result::Result<T, HydramonError>;
