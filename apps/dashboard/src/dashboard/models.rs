use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scores above this produce an alert and a "medium" risk level.
pub const MEDIUM_RISK_THRESHOLD: u8 = 25;
/// Scores above this produce a high-severity alert and a "high" risk level.
pub const HIGH_RISK_THRESHOLD: u8 = 50;

/// The social network a monitored account lives on.
/// Names are trimmed and lowercased; unknown ones are kept as `Other` so the
/// scan service decides what it supports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlatformKind {
    Twitter,
    LinkedIn,
    YouTube,
    TikTok,
    Reddit,
    Other(String),
}

impl PlatformKind {
    pub fn as_str(&self) -> &str {
        match self {
            PlatformKind::Twitter => "twitter",
            PlatformKind::LinkedIn => "linkedin",
            PlatformKind::YouTube => "youtube",
            PlatformKind::TikTok => "tiktok",
            PlatformKind::Reddit => "reddit",
            PlatformKind::Other(name) => name,
        }
    }
}

impl From<String> for PlatformKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "twitter" => PlatformKind::Twitter,
            "linkedin" => PlatformKind::LinkedIn,
            "youtube" => PlatformKind::YouTube,
            "tiktok" => PlatformKind::TikTok,
            "reddit" => PlatformKind::Reddit,
            other => PlatformKind::Other(other.to_string()),
        }
    }
}

impl From<PlatformKind> for String {
    fn from(value: PlatformKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A social-media account configured for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u64,
    pub platform: PlatformKind,
    pub username: String,
    pub enabled: bool,
    pub last_scan: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
}

/// Add-platform form payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlatform {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A user-facing notification derived from a scan outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
    /// Scan that produced this alert; `None` for alerts not tied to a scan.
    #[serde(default)]
    pub scan_id: Option<u64>,
}

/// Header badge classification, using the same thresholds as alert derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if score > MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low risk detected",
            RiskLevel::Medium => "Medium risk detected",
            RiskLevel::High => "High risk detected",
        }
    }
}

/// How the headline score is derived from completed scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatePolicy {
    /// The most recent successful scan overwrites the headline score.
    LastScan,
    /// Highest score across all scanned platforms.
    Max,
}

impl FromStr for AggregatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" | "last_scan" => Ok(AggregatePolicy::LastScan),
            "max" => Ok(AggregatePolicy::Max),
            other => anyhow::bail!("RISK_AGGREGATE must be 'last' or 'max', got '{other}'"),
        }
    }
}

/// One point on the risk trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub at: DateTime<Utc>,
    pub risk: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Completed,
    Failed,
}

/// One entry in the scan history, written for every finished scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: u64,
    pub platform_id: u64,
    pub platform: PlatformKind,
    pub username: String,
    pub scanned_at: DateTime<Utc>,
    pub status: ScanStatus,
    pub risk_score: Option<u8>,
    pub error: Option<String>,
}

/// What a scan needs to know about the platform, captured before the lock is released.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanTarget {
    pub platform_id: u64,
    pub platform: PlatformKind,
    pub username: String,
}
