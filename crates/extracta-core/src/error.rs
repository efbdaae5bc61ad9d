use thiserror::Error;

/// Application-wide error types for Extracta.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required UI control or option is absent from the page.
    #[error("Control not found: {0}")]
    ControlNotFound(String),

    /// Expected page content did not change within the bound.
    #[error("Timed out after {seconds} seconds waiting for {what}")]
    TimeoutExceeded { what: String, seconds: u64 },

    /// Fewer numbers were recovered than a complete draw requires.
    #[error("Extraction incomplete: {0}")]
    ExtractionIncomplete(String),

    /// Expected store directory or file is missing or unreadable.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Browser automation (CDP) failed.
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// HTTP request failed (fetching a page).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Page navigation timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::ControlNotFound(_)
            | AppError::TimeoutExceeded { .. }
            | AppError::ExtractionIncomplete(_)
            | AppError::BrowserError(_)
            | AppError::NetworkError(_)
            | AppError::Timeout(_) => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }
}
