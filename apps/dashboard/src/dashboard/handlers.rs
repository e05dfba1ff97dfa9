use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::dashboard::models::{Alert, NewPlatform, Platform, ScanRecord};
use crate::dashboard::report::{build_report, report_to_csv};
use crate::dashboard::scan::run_scan;
use crate::dashboard::store::{
    DashboardSummary, PlatformView, ScanDetail, ScanReport, DEFAULT_SCAN_LIMIT,
};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AlertQuery {
    pub acknowledged: Option<bool>,
}

#[derive(Deserialize)]
pub struct ScanQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct PlatformPatch {
    pub enabled: bool,
}

#[derive(Serialize)]
pub struct SupportedPlatformsResponse {
    pub platforms: Vec<String>,
}

/// GET /api/v1/dashboard
pub async fn handle_dashboard(State(state): State<AppState>) -> Json<DashboardSummary> {
    Json(state.store.read().await.summary())
}

/// GET /api/v1/platforms
pub async fn handle_list_platforms(State(state): State<AppState>) -> Json<Vec<PlatformView>> {
    Json(state.store.read().await.platform_views())
}

/// POST /api/v1/platforms
pub async fn handle_add_platform(
    State(state): State<AppState>,
    Json(req): Json<NewPlatform>,
) -> Result<(StatusCode, Json<Platform>), AppError> {
    let platform = state.store.write().await.add_platform(req)?;
    Ok((StatusCode::CREATED, Json(platform)))
}

/// PATCH /api/v1/platforms/:id
pub async fn handle_update_platform(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<PlatformPatch>,
) -> Result<Json<Platform>, AppError> {
    let platform = state
        .store
        .write()
        .await
        .set_platform_enabled(id, req.enabled)?;
    Ok(Json(platform))
}

/// GET /api/v1/platforms/supported
pub async fn handle_supported_platforms(
    State(state): State<AppState>,
) -> Json<SupportedPlatformsResponse> {
    Json(SupportedPlatformsResponse {
        platforms: state.scanner.list_supported_platforms().await,
    })
}

/// POST /api/v1/platforms/:id/scan
pub async fn handle_start_scan(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ScanReport>, AppError> {
    let task = tokio::spawn(run_scan(state.store.clone(), state.scanner.clone(), id));
    let report = task.await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!("scan task for platform {id} failed: {e}"))
    })??;
    Ok(Json(report))
}

/// GET /api/v1/scans
pub async fn handle_list_scans(
    State(state): State<AppState>,
    Query(params): Query<ScanQuery>,
) -> Json<Vec<ScanRecord>> {
    let limit = params.limit.unwrap_or(DEFAULT_SCAN_LIMIT);
    Json(state.store.read().await.scans(limit))
}

/// GET /api/v1/scans/:id
pub async fn handle_get_scan(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ScanDetail>, AppError> {
    let detail = state.store.read().await.scan_detail(id)?;
    Ok(Json(detail))
}

/// GET /api/v1/alerts
pub async fn handle_list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertQuery>,
) -> Json<Vec<Alert>> {
    Json(state.store.read().await.alerts_filtered(params.acknowledged))
}

/// POST /api/v1/alerts/:id/acknowledge
pub async fn handle_acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Alert>, AppError> {
    let alert = state.store.write().await.acknowledge_alert(id)?;
    Ok(Json(alert))
}

/// GET /api/v1/reports?format=json|csv
pub async fn handle_report(
    State(state): State<AppState>,
    Query(params): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let report = build_report(&*state.store.read().await, Utc::now());
    match params.format.as_deref().unwrap_or("json") {
        "json" => Ok(Json(report).into_response()),
        "csv" => {
            let body = report_to_csv(&report)?;
            Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
        }
        other => Err(AppError::Validation(format!(
            "Unsupported report format '{other}', expected 'json' or 'csv'"
        ))),
    }
}
