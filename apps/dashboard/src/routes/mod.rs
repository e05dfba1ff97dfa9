pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::dashboard::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Dashboard tab
        .route("/api/v1/dashboard", get(handlers::handle_dashboard))
        // Platforms tab
        .route(
            "/api/v1/platforms",
            get(handlers::handle_list_platforms).post(handlers::handle_add_platform),
        )
        .route(
            "/api/v1/platforms/supported",
            get(handlers::handle_supported_platforms),
        )
        .route(
            "/api/v1/platforms/:id",
            patch(handlers::handle_update_platform),
        )
        .route(
            "/api/v1/platforms/:id/scan",
            post(handlers::handle_start_scan),
        )
        // Scan history
        .route("/api/v1/scans", get(handlers::handle_list_scans))
        .route("/api/v1/scans/:id", get(handlers::handle_get_scan))
        // Alerts tab
        .route("/api/v1/alerts", get(handlers::handle_list_alerts))
        .route(
            "/api/v1/alerts/:id/acknowledge",
            post(handlers::handle_acknowledge_alert),
        )
        // Reports tab
        .route("/api/v1/reports", get(handlers::handle_report))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::dashboard::models::AggregatePolicy;
    use crate::dashboard::scan::tests::FakeScanner;
    use crate::dashboard::seed::demo_store;
    use crate::dashboard::store::DashboardStore;
    use crate::scan_client::DemoScanResponse;

    fn app_with(scanner: FakeScanner, store: DashboardStore) -> Router {
        build_router(AppState {
            store: Arc::new(RwLock::new(store)),
            scanner: Arc::new(scanner),
            config: Config::default(),
        })
    }

    fn demo_app(scanner: FakeScanner) -> Router {
        app_with(scanner, demo_store(AggregatePolicy::LastScan, Utc::now()))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = demo_app(FakeScanner::scoring(0.0));
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["scan_api"], "http://localhost:5001/api");
    }

    #[tokio::test]
    async fn test_dashboard_summary_from_demo_data() {
        let app = demo_app(FakeScanner::scoring(0.0));
        let (status, body) = send(&app, Method::GET, "/api/v1/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overall_risk_score"], 18);
        assert_eq!(body["risk_level"], "low");
        assert_eq!(body["active_platforms"], 2);
        assert_eq!(body["unread_alerts"], 1);
        assert_eq!(body["recent_alerts"].as_array().unwrap().len(), 2);
        assert_eq!(body["risk_trend"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_scan_twitter_high_risk_end_to_end() {
        let app = demo_app(FakeScanner::scoring(60.0));

        let (status, body) = send(&app, Method::POST, "/api/v1/platforms/2/scan", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], "completed");
        assert_eq!(body["overall_risk_score"], 60);
        assert_eq!(body["platform"]["risk_score"], 60);
        assert!(!body["platform"]["last_scan"].is_null());

        let (_, alerts) = send(&app, Method::GET, "/api/v1/alerts", None).await;
        let alerts = alerts.as_array().unwrap();
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0]["severity"], "high");
        assert!(alerts[0]["title"].as_str().unwrap().contains("twitter"));
        assert_eq!(alerts[0]["id"], 3);

        let (_, dashboard) = send(&app, Method::GET, "/api/v1/dashboard", None).await;
        assert_eq!(dashboard["overall_risk_score"], 60);
        assert_eq!(dashboard["risk_level"], "high");
    }

    #[tokio::test]
    async fn test_failed_scan_is_reported_not_errored() {
        let app = demo_app(FakeScanner::returning(Ok(DemoScanResponse {
            success: false,
            scan: None,
            error: Some("timeout".to_string()),
        })));

        let (status, body) = send(&app, Method::POST, "/api/v1/platforms/1/scan", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], "failed");
        assert_eq!(body["alert"]["title"], "Scan Failed");
        assert_eq!(body["alert"]["severity"], "high");
        assert!(body["alert"]["description"]
            .as_str()
            .unwrap()
            .contains("timeout"));
        assert_eq!(body["overall_risk_score"], 18);
    }

    #[tokio::test]
    async fn test_scan_unknown_platform_404() {
        let app = demo_app(FakeScanner::scoring(10.0));
        let (status, body) = send(&app, Method::POST, "/api/v1/platforms/99/scan", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_add_platform_and_validation() {
        let app = demo_app(FakeScanner::scoring(0.0));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/platforms",
            Some(json!({ "platform": "reddit", "username": "jd" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 4);
        assert_eq!(body["platform"], "reddit");
        assert_eq!(body["enabled"], true);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/platforms",
            Some(json!({ "platform": "tiktok", "username": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (_, platforms) = send(&app, Method::GET, "/api/v1/platforms", None).await;
        assert_eq!(platforms.as_array().unwrap().len(), 4);
        assert_eq!(platforms[0]["scanning"], false);
    }

    #[tokio::test]
    async fn test_toggle_platform() {
        let app = demo_app(FakeScanner::scoring(0.0));
        let (status, body) = send(
            &app,
            Method::PATCH,
            "/api/v1/platforms/3",
            Some(json!({ "enabled": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enabled"], true);

        let (_, dashboard) = send(&app, Method::GET, "/api/v1/dashboard", None).await;
        assert_eq!(dashboard["active_platforms"], 3);
    }

    #[tokio::test]
    async fn test_acknowledge_and_filter_alerts() {
        let app = demo_app(FakeScanner::scoring(0.0));
        let (status, body) =
            send(&app, Method::POST, "/api/v1/alerts/1/acknowledge", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["acknowledged"], true);

        let (_, unread) = send(&app, Method::GET, "/api/v1/alerts?acknowledged=false", None).await;
        assert!(unread.as_array().unwrap().is_empty());

        let (status, _) = send(&app, Method::POST, "/api/v1/alerts/42/acknowledge", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_supported_platforms_proxied() {
        let app = demo_app(FakeScanner::scoring(0.0));
        let (status, body) = send(&app, Method::GET, "/api/v1/platforms/supported", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["platforms"], json!(["twitter", "linkedin"]));
    }

    #[tokio::test]
    async fn test_report() {
        let app = app_with(
            FakeScanner::scoring(0.0),
            DashboardStore::new(AggregatePolicy::LastScan),
        );
        let (status, body) = send(&app, Method::GET, "/api/v1/reports", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overall_risk_score"], 0);
        assert!(body["highest_risk_platform"].is_null());
    }

    #[tokio::test]
    async fn test_scan_history_and_detail() {
        let app = demo_app(FakeScanner::scoring(60.0));
        let (_, report) = send(&app, Method::POST, "/api/v1/platforms/2/scan", None).await;
        let scan_id = report["scan"]["id"].as_u64().unwrap();
        assert_eq!(report["alert"]["scan_id"], scan_id);

        let (status, scans) = send(&app, Method::GET, "/api/v1/scans?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        let scans = scans.as_array().unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0]["status"], "completed");
        assert_eq!(scans[0]["platform"], "twitter");
        assert_eq!(scans[0]["risk_score"], 60);

        let uri = format!("/api/v1/scans/{scan_id}");
        let (status, detail) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["scan"], report["scan"]);
        assert_eq!(detail["alerts"], json!([report["alert"].clone()]));

        let (status, _) = send(&app, Method::GET, "/api/v1/scans/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_scan_appears_in_history_as_failed() {
        let app = demo_app(FakeScanner::returning(Ok(DemoScanResponse {
            success: false,
            scan: None,
            error: Some("timeout".to_string()),
        })));
        let (_, before) = send(&app, Method::GET, "/api/v1/platforms", None).await;
        send(&app, Method::POST, "/api/v1/platforms/1/scan", None).await;

        let (_, scans) = send(&app, Method::GET, "/api/v1/scans", None).await;
        assert_eq!(scans[0]["status"], "failed");
        assert_eq!(scans[0]["error"], "timeout");
        assert!(scans[0]["risk_score"].is_null());

        let (_, after) = send(&app, Method::GET, "/api/v1/platforms", None).await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_report_as_csv() {
        let app = demo_app(FakeScanner::scoring(0.0));
        let request = Request::builder()
            .uri("/api/v1/reports?format=csv")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/csv; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("Platform,Username,"));

        let (status, body) =
            send(&app, Method::GET, "/api/v1/reports?format=pdf", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
