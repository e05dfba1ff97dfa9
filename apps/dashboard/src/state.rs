use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::dashboard::store::DashboardStore;
use crate::scan_client::ScanService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<DashboardStore>>,
    /// Remote scan service. Default: `ScanClient` over HTTP.
    pub scanner: Arc<dyn ScanService>,
    pub config: Config,
}
