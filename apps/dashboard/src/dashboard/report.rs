//! Footprint report for the Reports tab, built from a store snapshot.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::models::{Platform, PlatformKind, RiskLevel, Severity};
use crate::dashboard::store::DashboardStore;

#[derive(Debug, Clone, Serialize)]
pub struct PlatformReportRow {
    pub id: u64,
    pub platform: PlatformKind,
    pub username: String,
    pub enabled: bool,
    pub last_scan: Option<DateTime<Utc>>,
    pub risk_score: Option<u8>,
    pub risk_level: Option<RiskLevel>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub unread: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FootprintReport {
    pub generated_at: DateTime<Utc>,
    pub overall_risk_score: u8,
    pub risk_level: RiskLevel,
    pub platforms: Vec<PlatformReportRow>,
    pub alert_counts: AlertCounts,
    pub highest_risk_platform: Option<PlatformReportRow>,
    pub recommendations: Vec<String>,
}

pub fn build_report(store: &DashboardStore, now: DateTime<Utc>) -> FootprintReport {
    let rows: Vec<PlatformReportRow> = store.platforms().iter().map(row).collect();

    let mut counts = AlertCounts::default();
    for alert in store.alerts() {
        match alert.severity {
            Severity::Low => counts.low += 1,
            Severity::Medium => counts.medium += 1,
            Severity::High => counts.high += 1,
        }
        if !alert.acknowledged {
            counts.unread += 1;
        }
    }

    // First platform wins on equal scores.
    let highest = rows
        .iter()
        .filter(|r| r.risk_score.is_some())
        .fold(None::<&PlatformReportRow>, |best, r| match best {
            Some(b) if b.risk_score >= r.risk_score => Some(b),
            _ => Some(r),
        })
        .cloned();

    let unread_high = store
        .alerts()
        .iter()
        .filter(|a| a.severity == Severity::High && !a.acknowledged)
        .count();

    FootprintReport {
        generated_at: now,
        overall_risk_score: store.risk_score(),
        risk_level: RiskLevel::from_score(store.risk_score()),
        recommendations: recommendations(&rows, unread_high),
        platforms: rows,
        alert_counts: counts,
        highest_risk_platform: highest,
    }
}

/// One CSV line per monitored platform.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Platform")]
    platform: &'a str,
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Enabled")]
    enabled: bool,
    #[serde(rename = "Risk Score")]
    risk_score: Option<u8>,
    #[serde(rename = "Risk Level")]
    risk_level: Option<RiskLevel>,
    #[serde(rename = "Last Scan")]
    last_scan: Option<String>,
    #[serde(rename = "Report Date")]
    report_date: String,
}

/// Renders the per-platform section of a report as CSV with a header line.
pub fn report_to_csv(report: &FootprintReport) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let report_date = report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string();
    for r in &report.platforms {
        writer
            .serialize(CsvRow {
                platform: r.platform.as_str(),
                username: &r.username,
                enabled: r.enabled,
                risk_score: r.risk_score,
                risk_level: r.risk_level,
                last_scan: r.last_scan.map(|t| t.to_rfc3339()),
                report_date: report_date.clone(),
            })
            .context("Failed to write report CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush report CSV: {e}"))?;
    String::from_utf8(bytes).context("Report CSV is not valid UTF-8")
}

fn row(p: &Platform) -> PlatformReportRow {
    PlatformReportRow {
        id: p.id,
        platform: p.platform.clone(),
        username: p.username.clone(),
        enabled: p.enabled,
        last_scan: p.last_scan,
        risk_score: p.risk_score,
        risk_level: p.risk_score.map(RiskLevel::from_score),
    }
}

fn recommendations(rows: &[PlatformReportRow], unread_high: usize) -> Vec<String> {
    let mut out = Vec::new();

    for r in rows {
        match r.risk_level {
            Some(RiskLevel::High) => out.push(format!(
                "Review recent activity on {} (@{}): risk score {}/100",
                r.platform,
                r.username,
                r.risk_score.unwrap_or_default()
            )),
            Some(RiskLevel::Medium) => out.push(format!(
                "Consider tightening privacy settings on {} (@{})",
                r.platform, r.username
            )),
            _ => {}
        }
        if r.enabled && r.last_scan.is_none() {
            out.push(format!(
                "{} (@{}) has never been scanned",
                r.platform, r.username
            ));
        }
    }

    if unread_high > 0 {
        out.push(format!("{unread_high} high-severity alert(s) need attention"));
    }
    if out.is_empty() {
        out.push("No action needed: your digital footprint looks healthy".to_string());
    }
    out
}
