/// Scan Client — the only code in the dashboard that talks to the remote scan service.
///
/// Three fixed calls: health, demo scan, supported platforms. No retries: every
/// failure is terminal for that request and surfaces as a "Scan Failed" alert
/// (scan) or an empty/`false` result (health, platform list).
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ScanClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct DemoScanRequest<'a> {
    platform: &'a str,
    username: &'a str,
}

/// Body of `POST /scan/demo`. Every field is optional on the wire; the
/// derivation rules decide what a missing score means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoScanResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub scan: Option<ScanSummary>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    #[serde(default)]
    pub risk_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SupportedPlatforms {
    #[serde(default)]
    platforms: Vec<String>,
}

/// The remote scan service as seen by the dashboard.
///
/// Carried in `AppState` as `Arc<dyn ScanService>` so handlers can be driven
/// by an in-process fake in tests.
#[async_trait]
pub trait ScanService: Send + Sync {
    /// Startup diagnostic. Returns whether the service answered; never errors.
    async fn check_health(&self) -> bool;

    async fn request_demo_scan(
        &self,
        platform: &str,
        username: &str,
    ) -> Result<DemoScanResponse, ScanClientError>;

    /// Platform names the scan service accepts. Empty on any failure.
    async fn list_supported_platforms(&self) -> Vec<String>;
}

/// HTTP implementation of [`ScanService`].
#[derive(Clone)]
pub struct ScanClient {
    client: Client,
    base_url: String,
}

impl ScanClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, ScanClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanClientError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ScanService for ScanClient {
    async fn check_health(&self) -> bool {
        match self.get_json("/health").await {
            Ok(body) => {
                info!("Scan service connection successful: {body}");
                true
            }
            Err(e) => {
                warn!("Scan service connection failed: {e}");
                false
            }
        }
    }

    async fn request_demo_scan(
        &self,
        platform: &str,
        username: &str,
    ) -> Result<DemoScanResponse, ScanClientError> {
        let response = self
            .client
            .post(self.url("/scan/demo"))
            .json(&DemoScanRequest { platform, username })
            .send()
            .await
            .map_err(|e| {
                warn!("Demo scan request for {platform}/{username} failed: {e}");
                ScanClientError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Demo scan for {platform}/{username} returned {status}");
            return Err(ScanClientError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: DemoScanResponse = serde_json::from_slice(&body)?;
        debug!(
            "Demo scan for {platform}/{username}: success={}, risk_score={:?}",
            parsed.success,
            parsed.scan.as_ref().and_then(|s| s.risk_score)
        );
        Ok(parsed)
    }

    async fn list_supported_platforms(&self) -> Vec<String> {
        match self.get_json("/platforms/supported").await {
            Ok(body) => match serde_json::from_value::<SupportedPlatforms>(body) {
                Ok(list) => list.platforms,
                Err(e) => {
                    warn!("Failed to decode supported platforms: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Failed to get supported platforms: {e}");
                Vec::new()
            }
        }
    }
}
