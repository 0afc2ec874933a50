//! Routing Types
//!
//! Core types for routing verdicts.
//! NO logic - only data structures.

use serde::{Deserialize, Serialize};

use crate::logic::error::ConfigError;

// ============================================================================
// ROUTING STATE
// ============================================================================

/// Verdict for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingState {
    /// Trusted, forwarded to the real upstream
    #[default]
    Real,
    /// Suspect but observation-only; still forwarded to the real upstream
    Monitoring,
    /// Contained. Terminal for the session.
    Decoy,
}

impl RoutingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingState::Real => "REAL",
            RoutingState::Monitoring => "MONITORING",
            RoutingState::Decoy => "DECOY",
        }
    }

    pub fn upstream(&self) -> Upstream {
        match self {
            RoutingState::Real | RoutingState::Monitoring => Upstream::Real,
            RoutingState::Decoy => Upstream::Decoy,
        }
    }

    /// MONITORING or DECOY; these evaluations are always logged synchronously
    pub fn is_suspect(&self) -> bool {
        !matches!(self, RoutingState::Real)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RoutingState::Decoy)
    }
}

impl std::fmt::Display for RoutingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// UPSTREAM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    Real,
    Decoy,
}

impl Upstream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::Real => "real",
            Upstream::Decoy => "decoy",
        }
    }
}

// ============================================================================
// TRANSITIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// Already DECOY; nothing moves it back
    OneWayEscalationLock,
    CanaryEscalation,
    ScoreAboveDecoy,
    ScoreAboveMonitor,
    RecoveredBelowMonitor,
    BelowThreshold,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionReason::OneWayEscalationLock => "one_way_escalation_lock",
            TransitionReason::CanaryEscalation => "canary_escalation",
            TransitionReason::ScoreAboveDecoy => "score_above_decoy",
            TransitionReason::ScoreAboveMonitor => "score_above_monitor",
            TransitionReason::RecoveredBelowMonitor => "recovered_below_monitor",
            TransitionReason::BelowThreshold => "below_threshold",
        }
    }
}

impl std::fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: RoutingState,
    pub to: RoutingState,
    pub reason: TransitionReason,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

// ============================================================================
// THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub monitor: f64,
    pub decoy: f64,
    pub max_score: f64,
}

impl Thresholds {
    /// Requires 0 <= monitor < decoy <= max_score
    pub fn new(monitor: f64, decoy: f64, max_score: f64) -> Result<Self, ConfigError> {
        let all_finite = monitor.is_finite() && decoy.is_finite() && max_score.is_finite();
        if !all_finite || monitor < 0.0 || monitor >= decoy || decoy > max_score || max_score <= 0.0 {
            return Err(ConfigError::InvalidThresholds(format!(
                "expected 0 <= monitor < decoy <= max_score, got monitor={} decoy={} max_score={}",
                monitor, decoy, max_score
            )));
        }
        Ok(Self { monitor, decoy, max_score })
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            monitor: 0.30,
            decoy: 0.60,
            max_score: 1.0,
        }
    }
}
