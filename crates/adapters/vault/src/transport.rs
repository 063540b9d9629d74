//! Transport abstraction over the Vault API
//!
//! The four operations here are everything the client and the health
//! reporter need from the remote service. Implementations are plain
//! pass-throughs: no caching and no validation of secret contents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Key/value payload of a secret
pub type SecretData = serde_json::Map<String, serde_json::Value>;

/// Health document returned by `sys/health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub initialized: bool,
    #[serde(default)]
    pub sealed: bool,
    #[serde(default)]
    pub standby: bool,
    #[serde(default)]
    pub performance_standby: bool,
    #[serde(default)]
    pub server_time_utc: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub cluster_id: String,
}

impl HealthResponse {
    /// Response of a reachable server with the given init state
    pub fn initialized(initialized: bool) -> Self {
        Self {
            initialized,
            ..Default::default()
        }
    }
}

/// Capability interface over the secret store
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Replace the token sent with subsequent requests
    fn set_credential(&self, token: &str);

    /// Read the `data` of the secret at `path`; `None` when nothing is stored
    async fn read_path(&self, path: &str) -> Result<Option<SecretData>, TransportError>;

    /// Write `data` to `path`
    async fn write_path(&self, path: &str, data: SecretData) -> Result<(), TransportError>;

    /// Query the server health endpoint
    async fn health(&self) -> Result<HealthResponse, TransportError>;
}
