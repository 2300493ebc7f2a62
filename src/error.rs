//! Error types for the provisioner.

use thiserror::Error;

/// Result type for provisioner operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Errors that can occur while reconciling models.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Invalid or incomplete configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A required credential file is absent or empty.
    #[error("credential not found: {0}")]
    MissingCredential(String),

    /// A filter or override pattern failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Network error (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The remote answered with a body we could not interpret.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ProvisionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProvisionError::Decode(err.to_string())
        } else {
            ProvisionError::Network(err.to_string())
        }
    }
}
