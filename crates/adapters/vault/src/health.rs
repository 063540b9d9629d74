//! Health check functionality for Vault

use std::sync::Arc;

use async_trait::async_trait;
use secretary_common::{Check, CheckSink, CheckState, HealthCheck, HealthStatus};
use tracing::debug;

use crate::error::{VaultError, VaultResult};
use crate::transport::Transport;

/// Component name reported to the health framework
pub const SERVICE_NAME: &str = "vault";

/// Check message when Vault is healthy
pub const MSG_HEALTHY: &str = "vault is healthy";

/// Status code published with every update
const STATUS_CODE: u16 = 0;

/// Maps the Vault health endpoint onto a health-check status.
///
/// Each call evaluates health once; scheduling is left to the caller.
#[derive(Debug)]
pub struct HealthReporter<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> Clone for HealthReporter<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> HealthReporter<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Query Vault once: unreachable is a transport error, reachable but
    /// uninitialised is [`VaultError::NotInitialised`].
    pub async fn healthcheck(&self) -> VaultResult<()> {
        let response = self.transport.health().await?;
        if !response.initialized {
            return Err(VaultError::NotInitialised);
        }
        Ok(())
    }

    /// Run one health check and publish the outcome to `sink`.
    ///
    /// Failures are reported as CRITICAL rather than returned.
    pub async fn checker<S>(&self, sink: &S)
    where
        S: CheckSink + ?Sized,
    {
        match self.healthcheck().await {
            Ok(()) => {
                debug!(component = SERVICE_NAME, "Vault health check passed");
                sink.update(HealthStatus::Ok, MSG_HEALTHY, STATUS_CODE);
            }
            Err(e) => {
                debug!(component = SERVICE_NAME, error = %e, "Vault health check failed");
                sink.update(HealthStatus::Critical, &e.to_string(), STATUS_CODE);
            }
        }
    }

    /// Run one health check into a fresh record instead of a shared sink
    pub async fn report(&self) -> Check {
        let state = CheckState::new(SERVICE_NAME);
        self.checker(&state).await;
        state.snapshot()
    }
}

#[async_trait]
impl<T: Transport> HealthCheck for HealthReporter<T> {
    fn component_name(&self) -> &'static str {
        SERVICE_NAME
    }

    async fn check(&self, sink: &dyn CheckSink) {
        self.checker(sink).await;
    }
}
