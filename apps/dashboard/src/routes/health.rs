use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and the scan service it talks to.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "argus-dashboard",
        "scan_api": state.config.scan_api_base_url,
        "risk_aggregate": state.config.risk_aggregate,
    }))
}
