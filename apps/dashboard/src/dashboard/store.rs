use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::dashboard::derivation::{derive_scan_result, AlertDraft, ScanOutcome};
use crate::dashboard::models::{
    AggregatePolicy, Alert, NewPlatform, Platform, PlatformKind, RiskLevel, ScanRecord,
    ScanStatus, ScanTarget, TrendPoint,
};
use crate::errors::AppError;

const RECENT_ALERTS: usize = 3;
/// Scan history page size when the caller gives no limit.
pub const DEFAULT_SCAN_LIMIT: usize = 50;

/// In-memory view state behind the dashboard: platforms, alerts, headline score
/// and the set of platforms with a scan in flight.
///
/// Held in `AppState` behind a `tokio::sync::RwLock`; every method here runs
/// with the lock held, so callers never see a half-applied update.
#[derive(Debug)]
pub struct DashboardStore {
    platforms: Vec<Platform>,
    /// Newest first.
    alerts: Vec<Alert>,
    risk_score: u8,
    risk_trend: Vec<TrendPoint>,
    /// Newest first.
    scans: Vec<ScanRecord>,
    scanning: HashSet<u64>,
    policy: AggregatePolicy,
    next_platform_id: u64,
    next_alert_id: u64,
    next_scan_id: u64,
}

/// Result of applying a completed scan, returned to the caller of the scan endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan: ScanRecord,
    pub platform: Platform,
    pub outcome: ScanOutcome,
    pub alert: Option<Alert>,
    pub overall_risk_score: u8,
}

/// One scan from the history together with the alerts it produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanDetail {
    pub scan: ScanRecord,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformView {
    #[serde(flatten)]
    pub platform: Platform,
    pub scanning: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionSlice {
    pub name: PlatformKind,
    /// Share of the summed platform risk, in percent.
    pub value: u8,
}

/// Dashboard tab payload.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub overall_risk_score: u8,
    pub risk_level: RiskLevel,
    pub risk_label: &'static str,
    pub active_platforms: usize,
    pub unread_alerts: usize,
    pub last_scan: Option<DateTime<Utc>>,
    pub scans_in_flight: usize,
    pub recent_alerts: Vec<Alert>,
    pub risk_trend: Vec<TrendPoint>,
    pub platform_distribution: Vec<DistributionSlice>,
}

impl DashboardStore {
    pub fn new(policy: AggregatePolicy) -> Self {
        Self {
            platforms: Vec::new(),
            alerts: Vec::new(),
            risk_score: 0,
            risk_trend: Vec::new(),
            scans: Vec::new(),
            scanning: HashSet::new(),
            policy,
            next_platform_id: 1,
            next_alert_id: 1,
            next_scan_id: 1,
        }
    }

    /// Builds a store from existing records; id counters continue past the highest id seen.
    pub fn from_parts(
        policy: AggregatePolicy,
        platforms: Vec<Platform>,
        alerts: Vec<Alert>,
        risk_score: u8,
        risk_trend: Vec<TrendPoint>,
    ) -> Self {
        let next_platform_id = platforms.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let next_alert_id = alerts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        Self {
            platforms,
            alerts,
            risk_score: risk_score.min(100),
            risk_trend,
            scans: Vec::new(),
            scanning: HashSet::new(),
            policy,
            next_platform_id,
            next_alert_id,
            next_scan_id: 1,
        }
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }

    pub fn policy(&self) -> AggregatePolicy {
        self.policy
    }

    pub fn is_scanning(&self, platform_id: u64) -> bool {
        self.scanning.contains(&platform_id)
    }

    pub fn platform(&self, platform_id: u64) -> Result<&Platform, AppError> {
        self.platforms
            .iter()
            .find(|p| p.id == platform_id)
            .ok_or_else(|| AppError::NotFound(format!("Platform {platform_id} not found")))
    }

    /// Scan history, newest first, at most `limit` entries.
    pub fn scans(&self, limit: usize) -> Vec<ScanRecord> {
        self.scans.iter().take(limit).cloned().collect()
    }

    pub fn scan_detail(&self, scan_id: u64) -> Result<ScanDetail, AppError> {
        let scan = self
            .scans
            .iter()
            .find(|s| s.id == scan_id)
            .ok_or_else(|| AppError::NotFound(format!("Scan {scan_id} not found")))?;
        Ok(ScanDetail {
            scan: scan.clone(),
            alerts: self
                .alerts
                .iter()
                .filter(|a| a.scan_id == Some(scan_id))
                .cloned()
                .collect(),
        })
    }

    pub fn platform_views(&self) -> Vec<PlatformView> {
        self.platforms
            .iter()
            .map(|p| PlatformView {
                platform: p.clone(),
                scanning: self.is_scanning(p.id),
            })
            .collect()
    }

    pub fn alerts_filtered(&self, acknowledged: Option<bool>) -> Vec<Alert> {
        self.alerts
            .iter()
            .filter(|a| acknowledged.map_or(true, |ack| a.acknowledged == ack))
            .cloned()
            .collect()
    }

    /// Adds a platform from the add-platform form. Empty fields are rejected
    /// and leave the list untouched.
    pub fn add_platform(&mut self, input: NewPlatform) -> Result<Platform, AppError> {
        let platform = input.platform.trim();
        let username = input.username.trim();
        if platform.is_empty() {
            return Err(AppError::Validation("platform is required".to_string()));
        }
        if username.is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }

        let record = Platform {
            id: self.next_platform_id,
            platform: PlatformKind::from(platform.to_string()),
            username: username.to_string(),
            enabled: true,
            last_scan: None,
            risk_score: None,
        };
        self.next_platform_id += 1;
        self.platforms.push(record.clone());

        info!(
            "Platform {} added: {}/{}",
            record.id, record.platform, record.username
        );
        Ok(record)
    }

    pub fn set_platform_enabled(
        &mut self,
        platform_id: u64,
        enabled: bool,
    ) -> Result<Platform, AppError> {
        let platform = self
            .platforms
            .iter_mut()
            .find(|p| p.id == platform_id)
            .ok_or_else(|| AppError::NotFound(format!("Platform {platform_id} not found")))?;
        platform.enabled = enabled;
        debug!("Platform {platform_id} enabled={enabled}");
        Ok(platform.clone())
    }

    /// Marks the platform as being scanned. Other platforms stay scannable.
    pub fn begin_scan(&mut self, platform_id: u64) -> Result<ScanTarget, AppError> {
        let platform = self.platform(platform_id)?;
        let target = ScanTarget {
            platform_id,
            platform: platform.platform.clone(),
            username: platform.username.clone(),
        };
        if !self.scanning.insert(platform_id) {
            return Err(AppError::Conflict(format!(
                "A scan of platform {platform_id} is already in progress"
            )));
        }
        Ok(target)
    }

    /// Applies a finished scan and clears the platform's in-flight mark.
    pub fn apply_scan_outcome(
        &mut self,
        platform_id: u64,
        outcome: ScanOutcome,
        now: DateTime<Utc>,
    ) -> Result<ScanReport, AppError> {
        self.scanning.remove(&platform_id);

        let index = self
            .platforms
            .iter()
            .position(|p| p.id == platform_id)
            .ok_or_else(|| AppError::NotFound(format!("Platform {platform_id} not found")))?;

        let derivation = derive_scan_result(&self.platforms[index], &outcome, now);
        let scanned = self.platforms[index].clone();
        let scan = self.record_scan(&scanned, &outcome, now);

        if let Some(updated) = derivation.updated_platform {
            let score = updated.risk_score;
            self.platforms[index] = updated;
            if let Some(score) = score {
                self.risk_score = self.aggregate(score);
                self.risk_trend.push(TrendPoint {
                    at: now,
                    risk: self.risk_score,
                });
            }
        }

        let alert = derivation
            .alert
            .map(|draft| self.push_alert(draft, now, Some(scan.id)));

        Ok(ScanReport {
            scan,
            platform: self.platforms[index].clone(),
            outcome,
            alert,
            overall_risk_score: self.risk_score,
        })
    }

    pub fn acknowledge_alert(&mut self, alert_id: u64) -> Result<Alert, AppError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| AppError::NotFound(format!("Alert {alert_id} not found")))?;
        alert.acknowledged = true;
        Ok(alert.clone())
    }

    pub fn summary(&self) -> DashboardSummary {
        let level = RiskLevel::from_score(self.risk_score);
        DashboardSummary {
            overall_risk_score: self.risk_score,
            risk_level: level,
            risk_label: level.label(),
            active_platforms: self.platforms.iter().filter(|p| p.enabled).count(),
            unread_alerts: self.alerts.iter().filter(|a| !a.acknowledged).count(),
            last_scan: self.platforms.iter().filter_map(|p| p.last_scan).max(),
            scans_in_flight: self.scanning.len(),
            recent_alerts: self.alerts.iter().take(RECENT_ALERTS).cloned().collect(),
            risk_trend: self.risk_trend.clone(),
            platform_distribution: self.platform_distribution(),
        }
    }

    fn platform_distribution(&self) -> Vec<DistributionSlice> {
        let mut by_kind: BTreeMap<String, (PlatformKind, u32)> = BTreeMap::new();
        for p in &self.platforms {
            if let Some(score) = p.risk_score {
                by_kind
                    .entry(p.platform.as_str().to_string())
                    .or_insert_with(|| (p.platform.clone(), 0))
                    .1 += u32::from(score);
            }
        }
        let total: u32 = by_kind.values().map(|(_, s)| s).sum();
        if total == 0 {
            return Vec::new();
        }
        by_kind
            .into_values()
            .map(|(name, score)| DistributionSlice {
                name,
                value: ((score * 100 + total / 2) / total) as u8,
            })
            .collect()
    }

    fn aggregate(&self, latest: u8) -> u8 {
        match self.policy {
            AggregatePolicy::LastScan => latest,
            AggregatePolicy::Max => self
                .platforms
                .iter()
                .filter_map(|p| p.risk_score)
                .max()
                .unwrap_or(latest),
        }
    }

    fn record_scan(
        &mut self,
        platform: &Platform,
        outcome: &ScanOutcome,
        now: DateTime<Utc>,
    ) -> ScanRecord {
        let (status, risk_score, error) = match outcome {
            ScanOutcome::Completed { risk_score } => {
                (ScanStatus::Completed, Some(*risk_score), None)
            }
            ScanOutcome::Failed { message } => {
                (ScanStatus::Failed, None, Some(message.clone()))
            }
        };
        let record = ScanRecord {
            id: self.next_scan_id,
            platform_id: platform.id,
            platform: platform.platform.clone(),
            username: platform.username.clone(),
            scanned_at: now,
            status,
            risk_score,
            error,
        };
        self.next_scan_id += 1;
        self.scans.insert(0, record.clone());
        record
    }

    fn push_alert(
        &mut self,
        draft: AlertDraft,
        now: DateTime<Utc>,
        scan_id: Option<u64>,
    ) -> Alert {
        let alert = Alert {
            id: self.next_alert_id,
            severity: draft.severity,
            title: draft.title,
            description: draft.description,
            acknowledged: false,
            created_at: now,
            scan_id,
        };
        self.next_alert_id += 1;
        self.alerts.insert(0, alert.clone());
        alert
    }
}
