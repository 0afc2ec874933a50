//! Compiled configuration snapshot
//!
//! Everything an evaluation needs, validated once. Shared as
//! `Arc<CompiledConfig>`; never mutated after construction.

use std::time::Duration as StdDuration;

use chrono::Duration;

use super::types::EngineConfig;
use crate::logic::canary::CanaryDetector;
use crate::logic::clock::secs;
use crate::logic::error::ConfigError;
use crate::logic::features::FeatureExtractor;
use crate::logic::forensics::RetryPolicy;
use crate::logic::risk::{DecayPolicy, SessionLimits};
use crate::logic::routing::Thresholds;
use crate::logic::rules::RuleSet;
use crate::logic::session::RouteCatalog;

#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub generation: u64,
    pub raw: EngineConfig,
    pub limits: SessionLimits,
    pub extractor: FeatureExtractor,
    pub thresholds: Thresholds,
    pub decay: DecayPolicy,
    pub max_advisor_delta: f64,
    pub rules: RuleSet,
    pub canary: CanaryDetector,
    pub catalog: RouteCatalog,
    pub real_sample_rate: f64,
    pub write_timeout: StdDuration,
    pub queue_capacity: usize,
    pub retry: RetryPolicy,
    pub idle_timeout: Duration,
    pub tombstone_horizon: Duration,
    pub clock_skew: Duration,
}

impl CompiledConfig {
    pub fn compile(raw: EngineConfig, generation: u64) -> Result<Self, ConfigError> {
        let window = &raw.window;
        if window.horizon_secs == 0 {
            return Err(ConfigError::InvalidWindow("horizon_secs must be > 0".to_string()));
        }
        if window.max_events == 0 {
            return Err(ConfigError::InvalidWindow("max_events must be > 0".to_string()));
        }
        if !window.min_rate_window_secs.is_finite() || window.min_rate_window_secs <= 0.0 {
            return Err(ConfigError::InvalidWindow(format!(
                "min_rate_window_secs must be > 0, got {}",
                window.min_rate_window_secs
            )));
        }
        if raw.sessions.idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidWindow("sessions.idle_timeout_secs must be > 0".to_string()));
        }

        let risk = &raw.risk;
        let thresholds = Thresholds::new(risk.monitor_threshold, risk.decoy_threshold, risk.max_score)?;
        let decay = DecayPolicy::compile(&risk.decay, risk.grace_secs)?;
        if !risk.max_advisor_delta.is_finite() || risk.max_advisor_delta < 0.0 {
            return Err(ConfigError::InvalidThresholds(format!(
                "max_advisor_delta must be >= 0, got {}",
                risk.max_advisor_delta
            )));
        }

        let forensics = &raw.forensics;
        if !(0.0..=1.0).contains(&forensics.real_sample_rate) {
            return Err(ConfigError::InvalidForensics(format!(
                "real_sample_rate must be within [0, 1], got {}",
                forensics.real_sample_rate
            )));
        }
        if forensics.write_timeout_ms == 0 {
            return Err(ConfigError::InvalidForensics("write_timeout_ms must be > 0".to_string()));
        }
        if forensics.queue_capacity == 0 {
            return Err(ConfigError::InvalidForensics("queue_capacity must be > 0".to_string()));
        }

        let horizon = secs(window.horizon_secs);

        Ok(Self {
            generation,
            limits: SessionLimits {
                horizon,
                max_events: window.max_events,
            },
            extractor: FeatureExtractor::new(horizon, window.min_rate_window_secs),
            thresholds,
            decay,
            max_advisor_delta: risk.max_advisor_delta,
            rules: RuleSet::compile(&raw.rules, raw.max_rule_delta)?,
            canary: CanaryDetector::new(&raw.canary.traps, raw.canary.max_page)?,
            catalog: RouteCatalog::compile(&raw.sensitive_routes)?,
            real_sample_rate: forensics.real_sample_rate,
            write_timeout: StdDuration::from_millis(forensics.write_timeout_ms),
            queue_capacity: forensics.queue_capacity,
            retry: forensics.retry,
            idle_timeout: secs(raw.sessions.idle_timeout_secs),
            tombstone_horizon: secs(raw.sessions.tombstone_secs),
            clock_skew: secs(raw.sessions.max_clock_skew_secs),
            raw,
        })
    }
}
