//! Engine Configuration
//!
//! JSON document. Every section and field has a default, so a config file
//! only needs to name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logic::canary::{default_traps, CanaryTrap};
use crate::logic::error::ConfigError;
use crate::logic::forensics::RetryPolicy;
use crate::logic::risk::DecayConfig;
use crate::logic::rules::{default_rules, RuleConfig, DEFAULT_MAX_RULE_DELTA};
use crate::logic::session::catalog::DEFAULT_SENSITIVE_ROUTES;

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Events older than this are dropped from the window
    pub horizon_secs: u64,
    pub max_events: usize,
    /// Floor for the request-rate denominator
    pub min_rate_window_secs: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            horizon_secs: 300,
            max_events: 500,
            min_rate_window_secs: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub monitor_threshold: f64,
    pub decoy_threshold: f64,
    pub max_score: f64,
    pub decay: DecayConfig,
    /// No decay until a session has been quiet this long
    pub grace_secs: f64,
    /// Cap on the combined advisor contribution per evaluation
    pub max_advisor_delta: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            monitor_threshold: 0.30,
            decoy_threshold: 0.60,
            max_score: 1.0,
            decay: DecayConfig::default(),
            grace_secs: 0.0,
            max_advisor_delta: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanaryConfig {
    pub traps: Vec<CanaryTrap>,
    /// `page` query values above this count as a canary hit
    pub max_page: Option<u64>,
}

impl Default for CanaryConfig {
    fn default() -> Self {
        Self {
            traps: default_traps(),
            max_page: Some(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicsConfig {
    /// Fraction of REAL evaluations that get a record
    pub real_sample_rate: f64,
    pub write_timeout_ms: u64,
    /// Background queue size (read at startup)
    pub queue_capacity: usize,
    pub retry: RetryPolicy,
}

impl Default for ForensicsConfig {
    fn default() -> Self {
        Self {
            real_sample_rate: 0.1,
            write_timeout_ms: 250,
            queue_capacity: 10_000,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    /// How long an evicted DECOY id stays contained
    pub tombstone_secs: u64,
    /// Request timestamps further than this ahead of receipt are clamped
    pub max_clock_skew_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            tombstone_secs: 24 * 3600,
            max_clock_skew_secs: 300,
        }
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub risk: RiskConfig,
    pub rules: Vec<RuleConfig>,
    pub max_rule_delta: Option<f64>,
    pub canary: CanaryConfig,
    /// Path prefixes, or regexes when starting with `^`
    pub sensitive_routes: Vec<String>,
    pub forensics: ForensicsConfig,
    pub sessions: SessionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            risk: RiskConfig::default(),
            rules: default_rules(),
            max_rule_delta: Some(DEFAULT_MAX_RULE_DELTA),
            canary: CanaryConfig::default(),
            sensitive_routes: DEFAULT_SENSITIVE_ROUTES.iter().map(|s| s.to_string()).collect(),
            forensics: ForensicsConfig::default(),
            sessions: SessionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Strict mode - lower thresholds, slower decay, log every evaluation
    pub fn strict() -> Self {
        let mut config = Self::default();
        config.risk.monitor_threshold = 0.20;
        config.risk.decoy_threshold = 0.45;
        config.risk.decay = DecayConfig::Exponential { half_life_secs: 900.0 };
        config.forensics.real_sample_rate = 1.0;
        config
    }

    /// Relaxed mode - tolerant of bursty clients, fast decay
    pub fn relaxed() -> Self {
        let mut config = Self::default();
        config.risk.monitor_threshold = 0.40;
        config.risk.decoy_threshold = 0.80;
        config.risk.decay = DecayConfig::Exponential { half_life_secs: 120.0 };
        config.forensics.real_sample_rate = 0.01;
        config
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
