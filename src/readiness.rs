// Copyright (c) 2025 - Cowboy AI, Inc.
//! Readiness Gate
//!
//! Poll-until-healthy for a freshly created cluster endpoint. The gate runs
//! in the backend's deferred execution phase, after the cluster resource
//! exists; it never blocks graph construction.
//!
//! Semantics reproduced exactly from the reference deployment: up to 60
//! attempts, 5 seconds apart, against `<endpoint>/healthz`, with TLS
//! certificate validation disabled. Any non-error HTTP response is success
//! and ends the loop immediately. Per-attempt failures are swallowed and
//! retried; only exhausting every attempt surfaces an error, and that
//! error is distinct from the transient ones.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::errors::ReadinessError;

/// A single failed probe attempt
///
/// Swallowed and retried by the gate; never escapes it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Probe attempt failed: {0}")]
pub struct ProbeAttemptError(pub String);

/// One health-check attempt against a URL
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probe the URL once; `Ok` means a non-error response
    async fn check(&self, url: &str) -> Result<(), ProbeAttemptError>;
}

/// HTTP GET probe with certificate validation disabled
///
/// The disabled validation is a reproduced design choice from the reference
/// deployment, not a recommendation: the poll may race the endpoint's
/// certificate provisioning.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    /// Build the probe client
    pub fn new() -> Result<Self, ReadinessError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ReadinessError::ProbeSetup(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self, url: &str) -> Result<(), ProbeAttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeAttemptError(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ProbeAttemptError(format!("status {status}")));
        }
        Ok(())
    }
}

/// Successful gate outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Poll-until-healthy gate with fixed attempt count and interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessGate {
    max_attempts: u32,
    interval: Duration,
}

impl ReadinessGate {
    /// Reference attempt budget
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

    /// Reference spacing between attempts
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Create a gate with an explicit budget
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Spacing between attempts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll `endpoint` + `path` until healthy or out of attempts
    ///
    /// Returns on the first non-error response. After `max_attempts`
    /// failures the gate reports [`ReadinessError::Timeout`] - exactly then,
    /// never earlier, never retrying past the budget.
    pub async fn wait_for_healthy(
        &self,
        probe: &dyn HealthProbe,
        endpoint: &str,
        path: &str,
    ) -> Result<ReadinessReport, ReadinessError> {
        let url = format!("{}{}", endpoint.trim_end_matches('/'), path);

        for attempt in 1..=self.max_attempts {
            match probe.check(&url).await {
                Ok(()) => {
                    info!(%url, attempt, "cluster endpoint healthy");
                    return Ok(ReadinessReport { attempts: attempt });
                }
                Err(e) => {
                    debug!(%url, attempt, error = %e, "health probe attempt failed");
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.interval).await;
                    }
                }
            }
        }

        Err(ReadinessError::Timeout {
            attempts: self.max_attempts,
        })
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_INTERVAL)
    }
}
