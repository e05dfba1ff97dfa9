mod config;
mod dashboard;
mod errors;
mod routes;
mod scan_client;
mod state;

use anyhow::Result;
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dashboard::seed::demo_store;
use crate::dashboard::store::DashboardStore;
use crate::routes::build_router;
use crate::scan_client::{ScanClient, ScanService};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Argus dashboard v{}", env!("CARGO_PKG_VERSION"));

    // Initialize scan client
    let scanner = ScanClient::new(
        config.scan_api_base_url.clone(),
        Duration::from_secs(config.scan_timeout_secs),
    )?;
    info!(
        "Scan client initialized (base: {}, timeout: {}s)",
        scanner.base_url(),
        config.scan_timeout_secs
    );

    // Startup diagnostic only; the dashboard serves even if the scan service is down.
    scanner.check_health().await;

    let store = if config.seed_demo_data {
        info!("Seeding demo dashboard data");
        demo_store(config.risk_aggregate, Utc::now())
    } else {
        DashboardStore::new(config.risk_aggregate)
    };
    info!("Risk aggregate policy: {:?}", store.policy());

    let state = AppState {
        store: Arc::new(RwLock::new(store)),
        scanner: Arc::new(scanner),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        // TODO: restrict CORS to the dashboard origin once it is deployed behind one
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
