//! In-memory transport for tests and local development

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use crate::error::TransportError;
use crate::transport::{HealthResponse, SecretData, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Writes are stored and returned verbatim
    Plain,
    /// Writes are `{"data": {...}}` and reads return a versioned envelope
    KvV2,
}

#[derive(Debug, Default)]
struct Store {
    secrets: HashMap<String, SecretData>,
    versions: HashMap<String, i64>,
    token: String,
    failure: Option<TransportError>,
    initialized: bool,
}

/// Call counters
#[derive(Debug, Default)]
struct Calls {
    read: AtomicUsize,
    write: AtomicUsize,
    health: AtomicUsize,
}

/// Secret store held in memory
#[derive(Debug)]
pub struct InMemoryTransport {
    mode: Mode,
    store: Mutex<Store>,
    calls: Calls,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    /// Plain key/value store
    pub fn new() -> Self {
        Self::with_mode(Mode::Plain)
    }

    /// Versioned store: each write bumps the version of its path
    pub fn kv_v2() -> Self {
        Self::with_mode(Mode::KvV2)
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            store: Mutex::new(Store {
                initialized: true,
                ..Default::default()
            }),
            calls: Calls::default(),
        }
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Store `data` at `path` exactly as a read should return it
    pub fn insert_raw(&self, path: impl Into<String>, data: SecretData) {
        self.store().secrets.insert(path.into(), data);
    }

    /// Make every following call fail with `error`; `None` clears it
    pub fn fail_with(&self, error: Option<TransportError>) {
        self.store().failure = error;
    }

    /// Set the `initialized` flag reported by `health`
    pub fn set_initialized(&self, initialized: bool) {
        self.store().initialized = initialized;
    }

    /// Last token passed to `set_credential`
    pub fn token(&self) -> String {
        self.store().token.clone()
    }

    pub fn read_calls(&self) -> usize {
        self.calls.read.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.calls.write.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.calls.health.load(Ordering::SeqCst)
    }

    fn check_failure(store: &Store) -> Result<(), TransportError> {
        match &store.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    fn set_credential(&self, token: &str) {
        self.store().token = token.to_string();
    }

    async fn read_path(&self, path: &str) -> Result<Option<SecretData>, TransportError> {
        self.calls.read.fetch_add(1, Ordering::SeqCst);
        let store = self.store();
        Self::check_failure(&store)?;
        Ok(store.secrets.get(path).cloned())
    }

    async fn write_path(&self, path: &str, data: SecretData) -> Result<(), TransportError> {
        self.calls.write.fetch_add(1, Ordering::SeqCst);
        let mut store = self.store();
        Self::check_failure(&store)?;

        let stored = match self.mode {
            Mode::Plain => data,
            Mode::KvV2 => {
                let payload = match data.get("data") {
                    Some(Value::Object(payload)) => payload.clone(),
                    _ => {
                        return Err(TransportError::Status {
                            code: 400,
                            message: format!("PUT {}: no data provided", path),
                        });
                    }
                };
                let version = store.versions.entry(path.to_string()).or_insert(0);
                *version += 1;
                let mut metadata = SecretData::new();
                metadata.insert("version".to_string(), json!(*version));
                metadata.insert("created_time".to_string(), json!(Utc::now().to_rfc3339()));
                metadata.insert("deletion_time".to_string(), json!(""));
                metadata.insert("destroyed".to_string(), json!(false));

                let mut envelope = SecretData::new();
                envelope.insert("data".to_string(), Value::Object(payload));
                envelope.insert("metadata".to_string(), Value::Object(metadata));
                envelope
            }
        };

        store.secrets.insert(path.to_string(), stored);
        Ok(())
    }

    async fn health(&self) -> Result<HealthResponse, TransportError> {
        self.calls.health.fetch_add(1, Ordering::SeqCst);
        let store = self.store();
        Self::check_failure(&store)?;
        Ok(HealthResponse::initialized(store.initialized))
    }
}
