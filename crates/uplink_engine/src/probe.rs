use std::time::Duration;

use chrono::Utc;
use uplink_core::UploadStatus;
use uplink_logging::{uplink_debug, uplink_warn};

use crate::decode::decode_status;

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Host the status server binds to. Only ever localhost in deployment;
    /// tests point this at a mock server.
    pub host: String,
    /// Per-attempt timeout when re-checking the sticky port.
    pub sticky_timeout: Duration,
    /// Per-attempt timeout for each port during a full scan.
    pub scan_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            sticky_timeout: Duration::from_millis(1000),
            scan_timeout: Duration::from_millis(500),
        }
    }
}

/// Result of one full probe cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Some port answered 200 with a decodable body. `status` is `None` when
    /// the body carried nothing actionable.
    Success {
        port: u16,
        status: Option<UploadStatus>,
    },
    /// Some port answered 200 but the body was not JSON. The port is still
    /// considered live.
    Malformed { port: u16 },
    /// No candidate port answered.
    Unreachable,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// One probe cycle: resolve the live port and fetch the status payload.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn poll(&self, preferred_port: Option<u16>, candidate_ports: &[u16]) -> PollOutcome;
}

pub struct ReqwestProber {
    settings: ProbeSettings,
    client: reqwest::Client,
}

impl ReqwestProber {
    pub fn new(settings: ProbeSettings) -> Result<Self, ProbeError> {
        // Timeouts are per request, not per client; attempts against a dead
        // port must fail fast without constraining the whole cycle.
        let client = reqwest::Client::builder().build()?;
        Ok(Self { settings, client })
    }

    /// One GET against one port. `None` on any transport failure, non-2xx or
    /// timeout; `Some` carries the decode result of the body.
    async fn attempt(
        &self,
        port: u16,
        timeout: Duration,
    ) -> Option<Result<Option<UploadStatus>, crate::DecodeError>> {
        // Cache-buster query; the server ignores it.
        let url = format!(
            "http://{}:{}/latest_upload.json?{}",
            self.settings.host,
            port,
            Utc::now().timestamp_millis()
        );
        let response = self.client.get(&url).timeout(timeout).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let bytes = response.bytes().await.ok()?;
        Some(decode_status(&bytes))
    }

    fn outcome(port: u16, decoded: Result<Option<UploadStatus>, crate::DecodeError>) -> PollOutcome {
        match decoded {
            Ok(status) => PollOutcome::Success { port, status },
            Err(err) => {
                uplink_warn!("port {}: {}", port, err);
                PollOutcome::Malformed { port }
            }
        }
    }
}

#[async_trait::async_trait]
impl Prober for ReqwestProber {
    async fn poll(&self, preferred_port: Option<u16>, candidate_ports: &[u16]) -> PollOutcome {
        // Sticky port first; only a failure there triggers a full scan.
        if let Some(port) = preferred_port {
            if let Some(decoded) = self.attempt(port, self.settings.sticky_timeout).await {
                return Self::outcome(port, decoded);
            }
            uplink_debug!("sticky port {} stopped answering, rescanning", port);
        }

        for &port in candidate_ports {
            if let Some(decoded) = self.attempt(port, self.settings.scan_timeout).await {
                uplink_debug!("status server found on port {}", port);
                return Self::outcome(port, decoded);
            }
        }

        PollOutcome::Unreachable
    }
}
