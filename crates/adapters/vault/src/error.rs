//! Error types for the Vault adapter

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::transport::Transport).
///
/// Surfaced to callers unchanged; [`VaultClient`](crate::client::VaultClient) never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport could not be built (bad address, unreadable TLS material).
    #[error("invalid transport configuration: {0}")]
    Configuration(String),

    /// The server could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with a non-success status.
    #[error("{message} (status {code})")]
    Status { code: u16, message: String },

    /// The server answered but the body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Whether the failure is worth another attempt.
    ///
    /// Connection failures, `412`, `429` and every `5xx` except `501`.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Status { code, .. } => {
                matches!(code, 412 | 429) || (*code >= 500 && *code != 501)
            }
            Self::Configuration(_) | Self::InvalidResponse(_) => false,
        }
    }

    /// HTTP status code, when the server produced one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Errors returned by [`VaultClient`](crate::client::VaultClient) and
/// [`HealthReporter`](crate::health::HealthReporter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("key not found")]
    KeyNotFound,

    /// The key exists but its value is not a string.
    #[error("value for key '{0}' is not a string")]
    ValueNotString(String),

    #[error("metadata not found")]
    MetadataNotFound,

    #[error("version not found")]
    VersionNotFound,

    #[error("version failed to convert to number")]
    VersionInvalid,

    #[error("data not found")]
    DataNotFound,

    #[error("vault not initialised")]
    NotInitialised,
}

pub type VaultResult<T> = Result<T, VaultError>;
