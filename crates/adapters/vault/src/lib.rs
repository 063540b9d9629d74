//! secretary-vault - HashiCorp Vault adapter
//!
//! Provides:
//! - Plain and versioned (KV v2) secret reads and writes
//! - Health reporting into a health-check sink
//! - A narrow [`Transport`] seam with HTTP, in-memory and mock implementations

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod health;
pub mod http;
pub mod memory;
pub mod transport;

pub use client::VaultClient;
pub use config::{VaultConfig, VaultConfigBuilder};
pub use envelope::{NO_VERSION, VersionedSecret};
pub use error::{TransportError, VaultError, VaultResult};
pub use health::{HealthReporter, MSG_HEALTHY, SERVICE_NAME};
pub use http::HttpTransport;
pub use memory::InMemoryTransport;
pub use transport::{HealthResponse, SecretData, Transport};

#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;
