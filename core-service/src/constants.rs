//! Central Configuration Constants
//!
//! Single source of truth for process-level defaults.
//! Engine tuning (rules, thresholds, decay) lives in `logic::config`.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "PhantomShield";

/// Directory name under the platform data dir
pub const DATA_DIR_NAME: &str = "phantomshield";

/// SQLite database file for forensic records
pub const FORENSIC_DB_FILE: &str = "forensics.db";

/// Directory for JSONL forensic logs
pub const FORENSIC_LOG_DIR: &str = "forensic_logs";

/// Default forensic sink kind
pub const DEFAULT_SINK_KIND: &str = "sqlite";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Engine config file path, if one is configured
pub fn get_config_path() -> Option<PathBuf> {
    std::env::var("PHANTOMSHIELD_CONFIG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

/// Base directory for forensic storage
pub fn get_data_dir() -> PathBuf {
    std::env::var("PHANTOMSHIELD_DATA_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DATA_DIR_NAME)
        })
}

/// Forensic sink kind: `sqlite`, `jsonl` or `memory`
pub fn get_sink_kind() -> String {
    std::env::var("FORENSIC_SINK")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|_| DEFAULT_SINK_KIND.to_string())
}
