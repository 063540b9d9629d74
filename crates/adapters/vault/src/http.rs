//! HTTP transport speaking the Vault v1 API

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, Secret};
use secretary_common::{RetryConfig, with_conditional_retry};
use serde::Deserialize;
use tracing::debug;

use crate::config::VaultConfig;
use crate::error::TransportError;
use crate::transport::{HealthResponse, SecretData, Transport};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Status codes remapped to 299 so any reachable server answers with a
/// health document instead of an error status.
const HEALTH_QUERY: &[(&str, &str)] = &[
    ("uninitcode", "299"),
    ("sealedcode", "299"),
    ("standbycode", "299"),
    ("drsecondarycode", "299"),
    ("performancestandbycode", "299"),
];

#[derive(Deserialize)]
struct SecretResponse {
    #[serde(default)]
    data: Option<SecretData>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

struct RawResponse {
    status: StatusCode,
    body: Vec<u8>,
}

/// Vault transport backed by `reqwest`
pub struct HttpTransport {
    http: reqwest::Client,
    address: String,
    token: RwLock<Secret<String>>,
    retry: RetryConfig,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("address", &self.address)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build the HTTP client from configuration, loading TLS material if set
    pub fn new(config: &VaultConfig) -> Result<Self, TransportError> {
        let address = config.address.trim_end_matches('/').to_string();
        reqwest::Url::parse(&address).map_err(|e| {
            TransportError::Configuration(format!("invalid address '{}': {}", address, e))
        })?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connection_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs));

        if let Some(ca_cert) = &config.ca_cert {
            let pem = read_pem(ca_cert)?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                TransportError::Configuration(format!("invalid CA certificate {}: {}", ca_cert, e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        match (&config.client_cert, &config.client_key) {
            (Some(cert), Some(key)) => {
                let mut pem = read_pem(cert)?;
                pem.push(b'\n');
                pem.extend(read_pem(key)?);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    TransportError::Configuration(format!("invalid client identity: {}", e))
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(TransportError::Configuration(
                    "client certificate and client key must be set together".to_string(),
                ));
            }
        }

        let http = builder
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            address,
            token: RwLock::new(config.token.clone()),
            retry: RetryConfig::with_retries(
                config.max_retries,
                Duration::from_millis(config.retry_min_wait_ms),
                Duration::from_millis(config.retry_max_wait_ms),
            ),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }

    fn token(&self) -> String {
        match self.token.read() {
            Ok(token) => token.expose_secret().clone(),
            Err(poisoned) => poisoned.into_inner().expose_secret().clone(),
        }
    }

    /// Send one request with retries. `404` is passed through as a response
    /// when `accept_not_found` is set; every other non-2xx status is an error.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&SecretData>,
        accept_not_found: bool,
    ) -> Result<RawResponse, TransportError> {
        let url = self.url(path);
        let operation = format!("vault {} {}", method, path);

        with_conditional_retry(
            &self.retry,
            &operation,
            || self.attempt(method.clone(), &url, query, body, accept_not_found),
            TransportError::is_retryable,
        )
        .await
    }

    async fn attempt(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&SecretData>,
        accept_not_found: bool,
    ) -> Result<RawResponse, TransportError> {
        let mut request = self.http.request(method.clone(), url).query(query);
        let token = self.token();
        if !token.is_empty() {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(map_reqwest_error)?
            .to_vec();

        debug!(method = %method, url, status = status.as_u16(), "Vault request completed");

        if status.is_success() || (accept_not_found && status == StatusCode::NOT_FOUND) {
            return Ok(RawResponse { status, body });
        }

        Err(TransportError::Status {
            code: status.as_u16(),
            message: error_message(&method, url, status, &body),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn set_credential(&self, token: &str) {
        let mut guard = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Secret::new(token.to_string());
    }

    async fn read_path(&self, path: &str) -> Result<Option<SecretData>, TransportError> {
        let response = self.execute(Method::GET, path, &[], None, true).await?;

        if response.status == StatusCode::NOT_FOUND {
            // KV v2 answers 404 for deleted versions but still returns their metadata
            let data = serde_json::from_slice::<SecretResponse>(&response.body)
                .ok()
                .and_then(|secret| secret.data)
                .filter(|data| !data.is_empty());
            debug!(path, found = data.is_some(), "Vault read returned 404");
            return Ok(data);
        }

        if response.body.is_empty() {
            return Ok(None);
        }

        let secret: SecretResponse = serde_json::from_slice(&response.body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        Ok(secret.data)
    }

    async fn write_path(&self, path: &str, data: SecretData) -> Result<(), TransportError> {
        self.execute(Method::PUT, path, &[], Some(&data), false)
            .await
            .map(|_| ())
    }

    async fn health(&self) -> Result<HealthResponse, TransportError> {
        let response = self
            .execute(Method::GET, "sys/health", HEALTH_QUERY, None, false)
            .await?;

        serde_json::from_slice(&response.body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

fn read_pem(path: &str) -> Result<Vec<u8>, TransportError> {
    std::fs::read(path)
        .map_err(|e| TransportError::Configuration(format!("failed to read {}: {}", path, e)))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::InvalidResponse(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}

fn error_message(method: &Method, url: &str, status: StatusCode, body: &[u8]) -> String {
    let errors = serde_json::from_slice::<ErrorResponse>(body)
        .map(|e| e.errors)
        .unwrap_or_default();

    let detail = if errors.is_empty() {
        status.canonical_reason().unwrap_or("unexpected status").to_string()
    } else {
        errors.join("; ")
    };

    format!("{} {}: {}", method, url, detail)
}
