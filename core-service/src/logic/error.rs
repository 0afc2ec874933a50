//! Error types for the engine.

use thiserror::Error;

/// Configuration rejected at load time. The previously active config stays in force.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rule '{rule}' references unknown feature '{feature}'")]
    UnknownFeature { rule: String, feature: String },

    #[error("duplicate rule id '{0}'")]
    DuplicateRule(String),

    #[error("invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),

    #[error("invalid decay function: {0}")]
    InvalidDecay(String),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid canary trap: {0}")]
    InvalidCanary(String),

    #[error("invalid forensic settings: {0}")]
    InvalidForensics(String),

    #[error("no config file configured for reload")]
    NoSource,

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Forensic sink failure.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("record {0} failed integrity check")]
    Corrupt(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced while wiring the engine (never on the evaluation path).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("config watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("config reloader thread: {0}")]
    Reloader(#[from] std::io::Error),
}
