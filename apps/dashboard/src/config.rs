use anyhow::{bail, Context, Result};

use crate::dashboard::models::AggregatePolicy;

const DEFAULT_SCAN_API_BASE_URL: &str = "http://localhost:5001/api";

/// Application configuration loaded from environment variables.
/// Every variable has a default, so a bare `cargo run` talks to a local scan service.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub scan_api_base_url: String,
    pub scan_timeout_secs: u64,
    pub risk_aggregate: AggregatePolicy,
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            scan_api_base_url: DEFAULT_SCAN_API_BASE_URL.to_string(),
            scan_timeout_secs: 30,
            risk_aggregate: AggregatePolicy::LastScan,
            seed_demo_data: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        Ok(Config {
            port: optional_env("PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(defaults.port),
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            scan_api_base_url: optional_env("SCAN_API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.scan_api_base_url),
            scan_timeout_secs: optional_env("SCAN_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("SCAN_TIMEOUT_SECS must be a whole number of seconds")?
                .unwrap_or(defaults.scan_timeout_secs),
            risk_aggregate: match optional_env("RISK_AGGREGATE") {
                Some(v) => v.parse()?,
                None => defaults.risk_aggregate,
            },
            seed_demo_data: match optional_env("SEED_DEMO_DATA") {
                Some(v) => parse_bool("SEED_DEMO_DATA", &v)?,
                None => defaults.seed_demo_data,
            },
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got '{other}'"),
    }
}
