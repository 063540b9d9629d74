//! Vault configuration

use secrecy::Secret;
use secretary_common::string_or_scalar;
use serde::{Deserialize, Deserializer};

/// Vault client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Vault server address
    #[serde(default = "default_address", alias = "addr")]
    pub address: String,

    /// Token sent with every request
    #[serde(default = "empty_token", deserialize_with = "secret_string")]
    pub token: Secret<String>,

    /// Extra attempts for retryable failures (0 disables retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, in milliseconds
    #[serde(default = "default_retry_min_wait")]
    pub retry_min_wait_ms: u64,

    /// Upper bound for the backoff, in milliseconds
    #[serde(default = "default_retry_max_wait")]
    pub retry_max_wait_ms: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// PEM file with the CA certificate used to verify the server
    #[serde(default, alias = "cacert")]
    pub ca_cert: Option<String>,

    /// PEM file with the client certificate
    #[serde(default)]
    pub client_cert: Option<String>,

    /// PEM file with the client private key
    #[serde(default)]
    pub client_key: Option<String>,
}

fn default_address() -> String {
    "http://127.0.0.1:8200".to_string()
}

fn empty_token() -> Secret<String> {
    Secret::new(String::new())
}

fn secret_string<'de, D>(deserializer: D) -> Result<Secret<String>, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_scalar(deserializer).map(Secret::new)
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_min_wait() -> u64 {
    1000
}

fn default_retry_max_wait() -> u64 {
    1500
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: empty_token(),
            max_retries: default_max_retries(),
            retry_min_wait_ms: default_retry_min_wait(),
            retry_max_wait_ms: default_retry_max_wait(),
            connection_timeout_secs: default_connection_timeout(),
            request_timeout_secs: default_request_timeout(),
            ca_cert: None,
            client_cert: None,
            client_key: None,
        }
    }
}

impl VaultConfig {
    /// Whether any TLS material is configured
    pub fn has_tls(&self) -> bool {
        self.ca_cert.is_some() || self.client_cert.is_some() || self.client_key.is_some()
    }
}

/// Builder for VaultConfig
#[derive(Debug)]
pub struct VaultConfigBuilder {
    config: VaultConfig,
}

impl VaultConfigBuilder {
    /// Create a new builder with address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            config: VaultConfig {
                address: address.into(),
                ..Default::default()
            },
        }
    }

    /// Set the token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Secret::new(token.into());
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the retry backoff bounds
    pub fn with_retry_wait(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.config.retry_min_wait_ms = min_ms;
        self.config.retry_max_wait_ms = max_ms;
        self
    }

    /// Set connection timeout
    pub fn with_connection_timeout(mut self, timeout_secs: u64) -> Self {
        self.config.connection_timeout_secs = timeout_secs;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout_secs: u64) -> Self {
        self.config.request_timeout_secs = timeout_secs;
        self
    }

    /// Set TLS material: CA certificate, client certificate and client key
    pub fn with_tls(
        mut self,
        ca_cert: impl Into<String>,
        client_cert: impl Into<String>,
        client_key: impl Into<String>,
    ) -> Self {
        self.config.ca_cert = Some(ca_cert.into());
        self.config.client_cert = Some(client_cert.into());
        self.config.client_key = Some(client_key.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> VaultConfig {
        self.config
    }
}
