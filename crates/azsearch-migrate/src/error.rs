//! Error types for azsearch-migrate.

use thiserror::Error;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a migration run.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file or value errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The service rejected the API key (HTTP 401/403).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Any other non-success response from a search service.
    #[error("Service error {status}: {body}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body, recovered best-effort.
        body: String,
    },

    /// A response body could not be decoded.
    #[error("Failed to decode {0}")]
    Decode(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error reading local files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
