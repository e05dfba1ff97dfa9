use chrono::{DateTime, TimeZone, Utc};

use crate::dashboard::models::{
    AggregatePolicy, Alert, Platform, PlatformKind, Severity, TrendPoint,
};
use crate::dashboard::store::DashboardStore;

const DEMO_RISK_SCORE: u8 = 18;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).single()
}

/// Store pre-populated with the demo account shown on first load.
pub fn demo_store(policy: AggregatePolicy, now: DateTime<Utc>) -> DashboardStore {
    let platforms = vec![
        Platform {
            id: 1,
            platform: PlatformKind::LinkedIn,
            username: "john-doe".to_string(),
            enabled: true,
            last_scan: at(2025, 1, 15, 10, 30),
            risk_score: None,
        },
        Platform {
            id: 2,
            platform: PlatformKind::Twitter,
            username: "johndoe".to_string(),
            enabled: true,
            last_scan: at(2025, 1, 15, 9, 15),
            risk_score: None,
        },
        Platform {
            id: 3,
            platform: PlatformKind::YouTube,
            username: "johndoechannel".to_string(),
            enabled: false,
            last_scan: None,
            risk_score: None,
        },
    ];

    let alerts = vec![
        Alert {
            id: 1,
            severity: Severity::Medium,
            title: "Controversial Tweet Detected".to_string(),
            description: "Recent tweet contains potentially controversial political content"
                .to_string(),
            acknowledged: false,
            created_at: now,
            scan_id: None,
        },
        Alert {
            id: 2,
            severity: Severity::Low,
            title: "Privacy Setting Recommendation".to_string(),
            description: "Consider updating LinkedIn privacy settings".to_string(),
            acknowledged: true,
            created_at: now,
            scan_id: None,
        },
    ];

    let trend = [
        ((2025, 1, 1), 15),
        ((2025, 1, 15), 22),
        ((2025, 2, 1), 18),
        ((2025, 2, 15), 12),
        ((2025, 3, 1), 8),
    ]
    .into_iter()
    .filter_map(|((y, m, d), risk)| at(y, m, d, 0, 0).map(|at| TrendPoint { at, risk }))
    .collect();

    DashboardStore::from_parts(policy, platforms, alerts, DEMO_RISK_SCORE, trend)
}
