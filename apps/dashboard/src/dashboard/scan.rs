use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::dashboard::derivation::ScanOutcome;
use crate::dashboard::store::{DashboardStore, ScanReport};
use crate::errors::AppError;
use crate::scan_client::ScanService;

/// Runs one scan end to end: mark in-flight, call the scan service with the
/// lock released, then apply the outcome.
///
/// Spawned onto its own task by the handler so a dropped HTTP connection
/// cannot leave the platform marked as scanning.
pub async fn run_scan(
    store: Arc<RwLock<DashboardStore>>,
    scanner: Arc<dyn ScanService>,
    platform_id: u64,
) -> Result<ScanReport, AppError> {
    let target = store.write().await.begin_scan(platform_id)?;
    info!(
        "Scanning platform {} ({}/{})",
        target.platform_id, target.platform, target.username
    );

    let response = scanner
        .request_demo_scan(target.platform.as_str(), &target.username)
        .await;
    let outcome = ScanOutcome::from_response(response);

    match &outcome {
        ScanOutcome::Completed { risk_score } => {
            info!("Scan of platform {platform_id} completed: risk_score={risk_score}")
        }
        ScanOutcome::Failed { message } => {
            warn!("Scan of platform {platform_id} failed: {message}")
        }
    }

    store
        .write()
        .await
        .apply_scan_outcome(platform_id, outcome, Utc::now())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    use crate::dashboard::models::{AggregatePolicy, NewPlatform, Severity};
    use crate::scan_client::{DemoScanResponse, ScanClientError, ScanSummary};

    /// Scan service fake: returns a fixed response, optionally parking until released.
    pub(crate) struct FakeScanner {
        pub response: Mutex<Option<Result<DemoScanResponse, ScanClientError>>>,
        pub gate: Option<Arc<Notify>>,
        pub supported: Vec<String>,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeScanner {
        pub(crate) fn scoring(score: f64) -> Self {
            Self::returning(Ok(DemoScanResponse {
                success: true,
                scan: Some(ScanSummary {
                    risk_score: Some(score),
                }),
                error: None,
            }))
        }

        pub(crate) fn returning(response: Result<DemoScanResponse, ScanClientError>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                gate: None,
                supported: vec!["twitter".to_string(), "linkedin".to_string()],
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScanService for FakeScanner {
        async fn check_health(&self) -> bool {
            true
        }

        async fn request_demo_scan(
            &self,
            platform: &str,
            username: &str,
        ) -> Result<DemoScanResponse, ScanClientError> {
            self.calls
                .lock()
                .unwrap()
                .push((platform.to_string(), username.to_string()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ScanClientError::Status { status: 599 }))
        }

        async fn list_supported_platforms(&self) -> Vec<String> {
            self.supported.clone()
        }
    }

    fn store_with(platform: &str) -> Arc<RwLock<DashboardStore>> {
        let mut store = DashboardStore::new(AggregatePolicy::LastScan);
        store
            .add_platform(NewPlatform {
                platform: platform.to_string(),
                username: "johndoe".to_string(),
            })
            .unwrap();
        Arc::new(RwLock::new(store))
    }

    #[tokio::test]
    async fn test_run_scan_applies_high_risk_result() {
        let store = store_with("twitter");
        let scanner = Arc::new(FakeScanner::scoring(60.0));

        let report = run_scan(store.clone(), scanner.clone(), 1).await.unwrap();
        assert_eq!(report.overall_risk_score, 60);
        assert_eq!(report.alert.unwrap().severity, Severity::High);
        assert_eq!(
            scanner.calls.lock().unwrap().as_slice(),
            &[("twitter".to_string(), "johndoe".to_string())]
        );

        let store = store.read().await;
        assert_eq!(store.risk_score(), 60);
        assert!(!store.is_scanning(1));
    }

    #[tokio::test]
    async fn test_run_scan_failure_produces_scan_failed_alert() {
        let store = store_with("reddit");
        let scanner = Arc::new(FakeScanner::returning(Ok(DemoScanResponse {
            success: false,
            scan: None,
            error: Some("timeout".to_string()),
        })));

        let report = run_scan(store.clone(), scanner, 1).await.unwrap();
        let alert = report.alert.unwrap();
        assert_eq!(alert.title, "Scan Failed");
        assert!(alert.description.contains("timeout"));
        assert_eq!(store.read().await.platforms()[0].last_scan, None);
    }

    #[tokio::test]
    async fn test_second_scan_of_same_platform_conflicts_while_in_flight() {
        let store = store_with("twitter");
        let gate = Arc::new(Notify::new());
        let scanner = Arc::new(FakeScanner {
            gate: Some(gate.clone()),
            ..FakeScanner::scoring(10.0)
        });

        let first = tokio::spawn(run_scan(store.clone(), scanner.clone(), 1));
        // Wait until the first scan has registered itself.
        while !store.read().await.is_scanning(1) {
            tokio::task::yield_now().await;
        }

        let second = run_scan(store.clone(), scanner.clone(), 1).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        gate.notify_one();
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.overall_risk_score, 10);
        assert!(!store.read().await.is_scanning(1));
    }

    #[tokio::test]
    async fn test_unknown_platform_is_not_found() {
        let store = store_with("twitter");
        let scanner = Arc::new(FakeScanner::scoring(10.0));
        let result = run_scan(store, scanner.clone(), 7).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(scanner.calls.lock().unwrap().is_empty());
    }
}
