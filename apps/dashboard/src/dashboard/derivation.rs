//! Scan Result Derivation — pure mapping from a scan outcome to the platform
//! update and the alert (if any) it produces.
//!
//! Three-way classification:
//! - failure                 → high "Scan Failed" alert, platform untouched
//! - success, score ≤ 25     → platform updated, no alert
//! - success, score > 25     → platform updated, medium (≤ 50) or high (> 50) alert

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::models::{
    Platform, PlatformKind, Severity, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD,
};
use crate::scan_client::{DemoScanResponse, ScanClientError};

const GENERIC_FAILURE: &str = "Scan failed";
const MISSING_SCORE: &str = "Scan response missing risk score";

/// What came back from the scan service, with transport and payload failures collapsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanOutcome {
    Completed { risk_score: u8 },
    Failed { message: String },
}

impl ScanOutcome {
    pub fn from_response(response: Result<DemoScanResponse, ScanClientError>) -> Self {
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                return ScanOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        if !response.success {
            return ScanOutcome::Failed {
                message: response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            };
        }

        match response.scan.and_then(|s| s.risk_score) {
            Some(raw) if raw.is_finite() => ScanOutcome::Completed {
                risk_score: normalize_score(raw),
            },
            _ => ScanOutcome::Failed {
                message: MISSING_SCORE.to_string(),
            },
        }
    }
}

/// Rounds a wire score to the nearest integer and clamps it to 0–100.
pub fn normalize_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// An alert before the store gives it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanDerivation {
    /// Replacement record for the scanned platform; `None` leaves it unchanged.
    pub updated_platform: Option<Platform>,
    pub alert: Option<AlertDraft>,
}

pub fn derive_scan_result(
    platform: &Platform,
    outcome: &ScanOutcome,
    now: DateTime<Utc>,
) -> ScanDerivation {
    match outcome {
        ScanOutcome::Failed { message } => ScanDerivation {
            updated_platform: None,
            alert: Some(scan_failed_alert(&platform.platform, message)),
        },
        ScanOutcome::Completed { risk_score } => {
            let score = *risk_score;
            let updated = Platform {
                last_scan: Some(now),
                risk_score: Some(score),
                ..platform.clone()
            };
            ScanDerivation {
                updated_platform: Some(updated),
                alert: risk_alert(&platform.platform, score),
            }
        }
    }
}

pub fn scan_failed_alert(platform: &PlatformKind, message: &str) -> AlertDraft {
    AlertDraft {
        severity: Severity::High,
        title: "Scan Failed".to_string(),
        description: format!("Failed to scan {platform}: {message}"),
    }
}

fn risk_alert(platform: &PlatformKind, score: u8) -> Option<AlertDraft> {
    if score <= MEDIUM_RISK_THRESHOLD {
        return None;
    }
    let severity = if score > HIGH_RISK_THRESHOLD {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(AlertDraft {
        severity,
        title: format!("Risk Detected on {platform}"),
        description: format!("Scan completed with risk score: {score}/100"),
    })
}
