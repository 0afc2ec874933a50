//! Engine - per-request pipeline
//!
//! classify -> buffer -> features -> canary -> rules + advisors ->
//! decay/update -> route -> forensic write -> decision.
//!
//! The whole pipeline for one session runs under that session's mutex,
//! including the synchronous forensic write, so a DECOY transition is never
//! visible before its record is durable. Different sessions run in parallel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::advisor::{consult, RiskAdvisor};
use crate::logic::clock::clamp_to_receipt;
use crate::logic::config::{CompiledConfig, ConfigStore};
use crate::logic::error::{ConfigError, SinkError};
use crate::logic::forensics::{
    ForensicLogger, ForensicQuery, ForensicRecord, ForensicSink, ForensicStatus, LoggerStats, SessionTimeline,
};
use crate::logic::risk::{RiskScoreManager, SessionView, StateCounts};
use crate::logic::routing::{decide, RoutingState, TransitionReason, Upstream};
use crate::logic::session::types::normalize_route;
use crate::logic::session::{is_well_formed_route, Event, RouteRequest, Sensitivity, UNKNOWN_ROUTE};

// ============================================================================
// DECISION
// ============================================================================

/// Routing decision for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub session_id: String,
    pub verdict: RoutingState,
    pub upstream: Upstream,
    pub previous_state: RoutingState,
    pub reason: TransitionReason,
    pub score: f64,
    pub risk_delta: f64,
    pub fired_rules: Vec<String>,
    pub canary: bool,
    pub canary_trap: Option<String>,
    /// A forensic record was produced for this evaluation
    pub sampled: bool,
    pub forensic: ForensicStatus,
    /// The request was malformed: evaluated under a placeholder route or a clamped timestamp
    pub degraded: bool,
    pub config_generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub evaluations: u64,
    pub degraded: u64,
    pub canary_hits: u64,
    pub decoy_escalations: u64,
    pub sessions: usize,
    pub tombstones: usize,
    pub states: StateCounts,
    pub config_generation: u64,
    pub forensics: LoggerStats,
}

#[derive(Default)]
struct Counters {
    evaluations: AtomicU64,
    degraded: AtomicU64,
    canary_hits: AtomicU64,
    decoy_escalations: AtomicU64,
}

struct Classified {
    route: String,
    method: String,
    sensitivity: Sensitivity,
    canary_trap: Option<String>,
    degraded: bool,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    config: Arc<ConfigStore>,
    sessions: RiskScoreManager,
    forensics: ForensicLogger,
    advisors: RwLock<Vec<Box<dyn RiskAdvisor>>>,
    counters: Counters,
    applied_generation: AtomicU64,
}

impl Engine {
    /// Must be called inside a tokio runtime (starts the forensic writer)
    pub fn new(config: Arc<ConfigStore>, sink: Arc<dyn ForensicSink>) -> Self {
        let current = config.current();
        let forensics = ForensicLogger::start(sink, current.queue_capacity, current.retry);
        info!(
            "Engine ready: {} rules, {} canary paths, config generation {}",
            current.rules.len(),
            current.canary.trap_count(),
            current.generation
        );

        Self {
            config,
            sessions: RiskScoreManager::new(),
            forensics,
            advisors: RwLock::new(Vec::new()),
            counters: Counters::default(),
            applied_generation: AtomicU64::new(current.generation),
        }
    }

    pub fn register_advisor(&self, advisor: Box<dyn RiskAdvisor>) {
        info!("Registered risk advisor: {}", advisor.name());
        self.advisors.write().push(advisor);
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn forensics(&self) -> &ForensicLogger {
        &self.forensics
    }

    pub fn reload_config(&self) -> Result<u64, ConfigError> {
        self.config.reload()
    }

    /// Evaluate one authenticated request. Never fails.
    pub async fn evaluate(&self, request: RouteRequest) -> Decision {
        let config = self.config.current();
        self.apply_runtime_settings(&config);
        self.counters.evaluations.fetch_add(1, Ordering::Relaxed);

        let (now, skewed) = clamp_to_receipt(request.timestamp, request.received_at, config.clock_skew);
        if skewed {
            warn!(
                "Timestamp {} for session {} is ahead of receipt, evaluating at {}",
                request.timestamp, request.session_id, now
            );
        }
        let class = self.classify(&request, &config);
        let degraded = class.degraded || skewed;
        if degraded {
            self.counters.degraded.fetch_add(1, Ordering::Relaxed);
        }

        let mut session = self
            .sessions
            .lock(&request.session_id, &request.subject, now, config.limits)
            .await;
        session.touch(now);

        let event = Event::new(&request.session_id, now, &class.route, &class.method, class.sensitivity);
        session.buffer.record(event.clone());
        let features = config.extractor.extract(session.buffer.snapshot(now), now);

        let canary = config.canary.check(&event);
        let outcome = config.rules.evaluate(&features);
        let advice = consult(&self.advisors.read(), &features, &event, config.max_advisor_delta);
        let delta = outcome.delta + advice.delta;

        let update = session.apply_delta(delta, now, &config.decay, config.thresholds.max_score);
        let transition = decide(update.previous_state, update.new_score, canary, &config.thresholds);
        session.set_state(transition.to);
        let verdict = session.state();

        let mut fired_rules = outcome.fired;
        fired_rules.extend(advice.contributors);

        if canary {
            self.counters.canary_hits.fetch_add(1, Ordering::Relaxed);
        }
        if transition.changed() {
            self.log_transition(&request, transition.from, verdict, transition.reason, update.new_score);
        }

        let suspect = transition.from.is_suspect() || verdict.is_suspect();
        let sampled = suspect || sample(config.real_sample_rate);
        let forensic = if sampled {
            let record = ForensicRecord {
                record_id: Uuid::new_v4(),
                session_id: request.session_id.clone(),
                subject: session.subject.clone(),
                timestamp: now,
                route: class.route,
                method: class.method,
                sensitivity: class.sensitivity,
                features,
                fired_rules: fired_rules.clone(),
                risk_delta: delta,
                score_before: update.previous_score,
                score_after: update.new_score,
                canary,
                canary_trap: class.canary_trap.clone(),
                previous_state: transition.from,
                verdict,
                reason: transition.reason,
                config_generation: config.generation,
                synchronous: suspect,
                degraded,
            };
            if suspect {
                self.forensics.record_sync(record, config.write_timeout).await
            } else {
                self.forensics.record_async(record)
            }
        } else {
            ForensicStatus::Skipped
        };
        drop(session);

        Decision {
            session_id: request.session_id,
            verdict,
            upstream: verdict.upstream(),
            previous_state: transition.from,
            reason: transition.reason,
            score: update.new_score,
            risk_delta: delta,
            fired_rules,
            canary,
            canary_trap: class.canary_trap,
            sampled,
            forensic,
            degraded,
            config_generation: config.generation,
        }
    }

    fn classify(&self, request: &RouteRequest, config: &CompiledConfig) -> Classified {
        let method = request.method.trim();
        let method = if method.is_empty() { "UNKNOWN" } else { method }.to_uppercase();

        if !is_well_formed_route(&request.route) {
            warn!(
                "Malformed route {:?} for session {}, recording as {}",
                request.route, request.session_id, UNKNOWN_ROUTE
            );
            return Classified {
                route: UNKNOWN_ROUTE.to_string(),
                method,
                sensitivity: Sensitivity::Normal,
                canary_trap: None,
                degraded: true,
            };
        }

        let route = normalize_route(&request.route).to_string();
        let canary_trap = config.canary.inspect(&route, &request.query).map(str::to_string);
        let sensitivity = if canary_trap.is_some() {
            Sensitivity::Canary
        } else {
            request
                .sensitivity
                .or_else(|| config.catalog.classify(&route))
                .unwrap_or(Sensitivity::Normal)
        };

        Classified {
            route,
            method,
            sensitivity,
            canary_trap,
            degraded: false,
        }
    }

    fn log_transition(
        &self,
        request: &RouteRequest,
        from: RoutingState,
        to: RoutingState,
        reason: TransitionReason,
        score: f64,
    ) {
        if to.is_terminal() {
            self.counters.decoy_escalations.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Session {} (subject {}) contained: {} -> {} ({}, score {:.3})",
                request.session_id, request.subject, from, to, reason, score
            );
        } else {
            info!(
                "Session {} {} -> {} ({}, score {:.3})",
                request.session_id, from, to, reason, score
            );
        }
    }

    /// Push hot-reloadable settings that live outside the snapshot
    fn apply_runtime_settings(&self, config: &CompiledConfig) {
        let applied = self.applied_generation.load(Ordering::Relaxed);
        if config.generation > applied
            && self
                .applied_generation
                .compare_exchange(applied, config.generation, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
        {
            self.forensics.set_retry_policy(config.retry);
            debug!("Applied runtime settings from config generation {}", config.generation);
        }
    }

    // ========================================================================
    // SESSION CONTROL
    // ========================================================================

    pub async fn session_view(&self, session_id: &str, now: DateTime<Utc>) -> Option<SessionView> {
        let config = self.config.current();
        self.sessions.peek(session_id, now, &config.decay).await
    }

    pub async fn end_session(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        self.sessions.end_session(session_id, now).await
    }

    /// Evict idle sessions and expired tombstones
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let config = self.config.current();
        self.sessions.evict_idle(now, config.idle_timeout, config.tombstone_horizon)
    }

    // ========================================================================
    // FORENSIC QUERIES
    // ========================================================================

    pub async fn query(&self, query: ForensicQuery) -> Result<Vec<ForensicRecord>, SinkError> {
        self.forensics.query(query).await
    }

    pub async fn timeline(&self, session_id: &str) -> Result<SessionTimeline, SinkError> {
        self.forensics.timeline(session_id).await
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            evaluations: self.counters.evaluations.load(Ordering::Relaxed),
            degraded: self.counters.degraded.load(Ordering::Relaxed),
            canary_hits: self.counters.canary_hits.load(Ordering::Relaxed),
            decoy_escalations: self.counters.decoy_escalations.load(Ordering::Relaxed),
            sessions: self.sessions.session_count(),
            tombstones: self.sessions.tombstone_count(),
            states: self.sessions.state_counts(),
            config_generation: self.config.generation(),
            forensics: self.forensics.stats(),
        }
    }
}

/// Bernoulli draw for REAL-state sampling
fn sample(rate: f64) -> bool {
    if rate <= 0.0 {
        false
    } else if rate >= 1.0 {
        true
    } else {
        rand::thread_rng().gen_bool(rate)
    }
}
