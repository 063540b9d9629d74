//! Versioned (KV v2) secret envelope
//!
//! A KV v2 read returns `{"data": {...}, "metadata": {"version": n, ...}}`.
//! Fields are checked in a fixed order, metadata, then version, then data,
//! and parsing stops at the first fault.

use serde_json::Value;

use crate::error::{VaultError, VaultResult};
use crate::transport::SecretData;

/// Version reported when no secret exists at a path
pub const NO_VERSION: i64 = -1;

const METADATA_FIELD: &str = "metadata";
const VERSION_FIELD: &str = "version";
const DATA_FIELD: &str = "data";

/// Payload and version of a versioned secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSecret {
    pub data: SecretData,
    pub version: i64,
}

impl VersionedSecret {
    /// Result for a path holding no secret
    pub fn absent() -> Self {
        Self {
            data: SecretData::new(),
            version: NO_VERSION,
        }
    }

    /// Whether a secret was found at the path
    pub fn exists(&self) -> bool {
        self.version != NO_VERSION
    }
}

/// Split a raw read result into payload and version.
///
/// An empty mapping means "no secret" and yields [`VersionedSecret::absent`].
pub fn parse(mut raw: SecretData) -> VaultResult<VersionedSecret> {
    if raw.is_empty() {
        return Ok(VersionedSecret::absent());
    }

    let metadata = match raw.get(METADATA_FIELD) {
        Some(Value::Object(metadata)) => metadata,
        _ => return Err(VaultError::MetadataNotFound),
    };
    let version = metadata
        .get(VERSION_FIELD)
        .ok_or(VaultError::VersionNotFound)
        .and_then(parse_version)?;

    match raw.remove(DATA_FIELD) {
        Some(Value::Object(data)) => Ok(VersionedSecret { data, version }),
        _ => Err(VaultError::DataNotFound),
    }
}

/// Wrap a payload for a versioned write
pub fn wrap(data: SecretData) -> SecretData {
    let mut envelope = SecretData::new();
    envelope.insert(DATA_FIELD.to_string(), Value::Object(data));
    envelope
}

fn parse_version(value: &Value) -> VaultResult<i64> {
    match value {
        Value::Number(number) => number.as_i64().ok_or(VaultError::VersionInvalid),
        Value::String(text) => text.trim().parse().map_err(|_| VaultError::VersionInvalid),
        _ => Err(VaultError::VersionInvalid),
    }
}
