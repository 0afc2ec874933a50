//! Forensic record types
//!
//! Records are immutable once built. The serialized JSON is the storage
//! format for every sink.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::logic::features::FeatureVector;
use crate::logic::routing::{RoutingState, TransitionReason};
use crate::logic::session::Sensitivity;

// ============================================================================
// RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicRecord {
    pub record_id: Uuid,
    pub session_id: String,
    pub subject: String,
    pub timestamp: DateTime<Utc>,
    pub route: String,
    pub method: String,
    pub sensitivity: Sensitivity,
    pub features: FeatureVector,
    pub fired_rules: Vec<String>,
    pub risk_delta: f64,
    pub score_before: f64,
    pub score_after: f64,
    pub canary: bool,
    pub canary_trap: Option<String>,
    pub previous_state: RoutingState,
    pub verdict: RoutingState,
    pub reason: TransitionReason,
    pub config_generation: u64,
    /// Written on the synchronous path
    pub synchronous: bool,
    /// The request was malformed and recorded under a placeholder route
    #[serde(default)]
    pub degraded: bool,
}

impl ForensicRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// SHA-256 of the serialized record, hex encoded
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let json = self.to_json()?;
        Ok(digest_of(&json))
    }

    pub fn is_transition(&self) -> bool {
        self.previous_state != self.verdict
    }

    /// MONITORING or DECOY on either side of the evaluation
    pub fn is_suspect(&self) -> bool {
        self.previous_state.is_suspect() || self.verdict.is_suspect()
    }
}

pub(crate) fn digest_of(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

// ============================================================================
// WRITE STATUS
// ============================================================================

/// Outcome of the forensic write for one evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForensicStatus {
    /// Synchronously appended before the decision was returned
    Durable,
    /// Handed to the background writer
    Queued,
    /// REAL evaluation not selected by sampling
    Skipped,
    /// Synchronous write failed or timed out; the verdict still stands
    Failed { reason: String },
}

impl ForensicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForensicStatus::Durable => "durable",
            ForensicStatus::Queued => "queued",
            ForensicStatus::Skipped => "skipped",
            ForensicStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ForensicStatus::Failed { .. })
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// Filter for sink queries. Results come back oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForensicQuery {
    pub session_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl ForensicQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn session(session_id: &str) -> Self {
        Self {
            session_id: Some(session_id.to_string()),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &ForensicRecord) -> bool {
        if let Some(id) = &self.session_id {
            if &record.session_id != id {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.timestamp > to {
                return false;
            }
        }
        true
    }

    /// Filter, sort and truncate an in-memory record set
    pub fn apply<'a, I>(&self, records: I) -> Vec<ForensicRecord>
    where
        I: IntoIterator<Item = &'a ForensicRecord>,
    {
        let mut out: Vec<ForensicRecord> = records.into_iter().filter(|r| self.matches(r)).cloned().collect();
        out.sort_by_key(|r| r.timestamp);
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

// ============================================================================
// TIMELINE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineTransition {
    pub timestamp: DateTime<Utc>,
    pub from: RoutingState,
    pub to: RoutingState,
    pub reason: TransitionReason,
}

/// Per-session summary built from its forensic records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTimeline {
    pub session_id: String,
    pub subject: Option<String>,
    pub record_count: usize,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub unique_routes: Vec<String>,
    pub rule_hits: BTreeMap<String, u64>,
    pub canary_hits: u64,
    pub peak_score: f64,
    pub last_verdict: Option<RoutingState>,
    pub transitions: Vec<TimelineTransition>,
}

impl SessionTimeline {
    pub fn from_records(session_id: &str, records: &[ForensicRecord]) -> Self {
        let mut ordered: Vec<&ForensicRecord> = records.iter().filter(|r| r.session_id == session_id).collect();
        ordered.sort_by_key(|r| r.timestamp);

        let mut routes: Vec<String> = Vec::new();
        let mut rule_hits = BTreeMap::new();
        let mut canary_hits = 0;
        let mut peak_score: f64 = 0.0;
        let mut transitions = Vec::new();

        for r in &ordered {
            if !routes.contains(&r.route) {
                routes.push(r.route.clone());
            }
            for rule in &r.fired_rules {
                *rule_hits.entry(rule.clone()).or_insert(0) += 1;
            }
            if r.canary {
                canary_hits += 1;
            }
            peak_score = peak_score.max(r.score_after);
            if r.is_transition() {
                transitions.push(TimelineTransition {
                    timestamp: r.timestamp,
                    from: r.previous_state,
                    to: r.verdict,
                    reason: r.reason,
                });
            }
        }

        Self {
            session_id: session_id.to_string(),
            subject: ordered.first().map(|r| r.subject.clone()),
            record_count: ordered.len(),
            first_seen: ordered.first().map(|r| r.timestamp),
            last_seen: ordered.last().map(|r| r.timestamp),
            unique_routes: routes,
            rule_hits,
            canary_hits,
            peak_score,
            last_verdict: ordered.last().map(|r| r.verdict),
            transitions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}
