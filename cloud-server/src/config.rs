//! Configuration module

use std::env;
use std::path::PathBuf;

use phantomshield_core::constants;

/// Gateway process configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Bearer token for the admin routes; admin API is disabled when unset
    pub admin_token: Option<String>,

    /// Engine config document (JSON), hot-reloaded when present
    pub engine_config_path: Option<PathBuf>,

    /// Watch the engine config file for changes
    pub watch_config: bool,

    /// Base directory for forensic storage
    pub data_dir: PathBuf,

    /// Forensic sink kind (sqlite, jsonl, memory)
    pub sink_kind: String,

    /// Idle session sweep period in seconds
    pub sweep_interval_secs: u64,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            admin_token: env::var("ADMIN_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),

            engine_config_path: constants::get_config_path(),

            watch_config: env::var("PHANTOMSHIELD_WATCH_CONFIG")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),

            data_dir: constants::get_data_dir(),

            sink_kind: constants::get_sink_kind(),

            sweep_interval_secs: env::var("SESSION_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60)
                .max(1),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
