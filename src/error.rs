//! Custom error types for biblioharvest.
//!
//! Transport and format errors are recovered per cell by the harvester;
//! configuration and I/O errors are fatal to a run.

use thiserror::Error;

/// Main error type for biblioharvest operations.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream returned a body we could not make sense of
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by the upstream API
    #[error("Rate limited by upstream (HTTP 429)")]
    RateLimited,

    /// Upstream API returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl HarvestError {
    /// Whether this error is recovered at cell granularity (fallback cell)
    /// rather than aborting the run.
    pub fn is_cell_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Parse(_) | Self::RateLimited | Self::Api { .. }
        )
    }
}

/// Result type alias using `HarvestError`
pub type Result<T> = std::result::Result<T, HarvestError>;
