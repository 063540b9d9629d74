//! Vault client implementation

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::debug;

use crate::config::VaultConfig;
use crate::envelope::{self, VersionedSecret};
use crate::error::{VaultError, VaultResult};
use crate::health::HealthReporter;
use crate::http::HttpTransport;
use crate::transport::{SecretData, Transport};

/// Reads and writes plain and versioned secrets through a [`Transport`]
#[derive(Debug)]
pub struct VaultClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
}

impl<T: Transport> Clone for VaultClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl VaultClient<HttpTransport> {
    /// Create a client talking HTTP to the configured Vault server
    pub fn new(config: &VaultConfig) -> VaultResult<Self> {
        debug!(address = %config.address, tls = config.has_tls(), "Creating Vault client");
        let transport = HttpTransport::new(config)?;
        transport.set_credential(config.token.expose_secret());
        Ok(Self::with_transport(transport))
    }
}

impl<T: Transport> VaultClient<T> {
    /// Create a client on top of an existing transport
    pub fn with_transport(transport: T) -> Self {
        Self::with_shared_transport(Arc::new(transport))
    }

    pub fn with_shared_transport(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Replace the token used for subsequent requests
    pub fn set_token(&self, token: &str) {
        self.transport.set_credential(token);
    }

    /// Health reporter sharing this client's transport
    pub fn health_reporter(&self) -> HealthReporter<T> {
        HealthReporter::new(Arc::clone(&self.transport))
    }

    /// Read the secret at `path`.
    ///
    /// A path with nothing stored yields an empty map, not an error.
    pub async fn read(&self, path: &str) -> VaultResult<SecretData> {
        let data = self.transport.read_path(path).await?;
        Ok(data.unwrap_or_default())
    }

    /// Read a single string value from the secret at `path`
    pub async fn read_key(&self, path: &str, key: &str) -> VaultResult<String> {
        let data = self.read(path).await?;
        string_value(&data, key)
    }

    /// Write `data` to `path`
    pub async fn write(&self, path: &str, data: SecretData) -> VaultResult<()> {
        self.transport.write_path(path, data).await?;
        Ok(())
    }

    /// Write a single key/value pair to `path`
    pub async fn write_key(&self, path: &str, key: &str, value: &str) -> VaultResult<()> {
        self.write(path, single_entry(key, value)).await
    }

    /// Read a versioned (KV v2) secret, returning its payload and version.
    ///
    /// An empty path yields an empty payload and version `-1`.
    pub async fn versioned_read(&self, path: &str) -> VaultResult<VersionedSecret> {
        let raw = self.read(path).await?;
        envelope::parse(raw)
    }

    /// Read a single string value and the version of a versioned secret
    pub async fn versioned_read_key(&self, path: &str, key: &str) -> VaultResult<(String, i64)> {
        let secret = self.versioned_read(path).await?;
        let value = string_value(&secret.data, key)?;
        Ok((value, secret.version))
    }

    /// Write a single key/value pair as a new version; the server stamps the version
    pub async fn versioned_write_key(&self, path: &str, key: &str, value: &str) -> VaultResult<()> {
        self.write(path, envelope::wrap(single_entry(key, value))).await
    }
}

fn single_entry(key: &str, value: &str) -> SecretData {
    let mut data = SecretData::new();
    data.insert(key.to_string(), Value::String(value.to_string()));
    data
}

fn string_value(data: &SecretData, key: &str) -> VaultResult<String> {
    match data.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(VaultError::ValueNotString(key.to_string())),
        None => Err(VaultError::KeyNotFound),
    }
}
