//! Risk Score Manager
//!
//! Owns every live session. The map lock is only held to find or insert a
//! handle; all per-session work happens under that session's own mutex.
//!
//! DECOY sessions that are ended or evicted leave a tombstone so that a
//! session re-created under the same id starts contained.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::decay::DecayPolicy;
use super::state::{ScoreUpdate, SessionState, SessionView};
use crate::logic::routing::RoutingState;
use crate::logic::session::EventBuffer;

type SessionHandle = Arc<Mutex<SessionState>>;

/// Window bounds applied to each session's buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionLimits {
    pub horizon: Duration,
    pub max_events: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            horizon: Duration::seconds(300),
            max_events: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub real: usize,
    pub monitoring: usize,
    pub decoy: usize,
    /// Sessions busy at the time of counting
    pub busy: usize,
}

#[derive(Default)]
pub struct RiskScoreManager {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    /// session id -> time it was contained and removed
    tombstones: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl RiskScoreManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, session_id: &str, subject: &str, now: DateTime<Utc>, limits: SessionLimits) -> SessionHandle {
        if let Some(handle) = self.sessions.read().get(session_id) {
            return handle.clone();
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let buffer = EventBuffer::new(limits.horizon, limits.max_events);
                let state = if self.tombstones.read().contains_key(session_id) {
                    info!("Session {} re-created under a contained id, starting in DECOY", session_id);
                    SessionState::contained(session_id, subject, now, buffer)
                } else {
                    debug!("Session {} created", session_id);
                    SessionState::new(session_id, subject, now, buffer)
                };
                Arc::new(Mutex::new(state))
            })
            .clone()
    }

    /// Lock a live session, creating it on first sight.
    ///
    /// The guard is held for the whole evaluation. A handle retired while we
    /// waited on it is skipped and the id resolved again.
    pub async fn lock(
        &self,
        session_id: &str,
        subject: &str,
        now: DateTime<Utc>,
        limits: SessionLimits,
    ) -> OwnedMutexGuard<SessionState> {
        loop {
            let mut guard = self.handle(session_id, subject, now, limits).lock_owned().await;
            if guard.is_retired() {
                continue;
            }
            guard.buffer.reconfigure(limits.horizon, limits.max_events);
            return guard;
        }
    }

    /// Decay, apply `delta` and persist the evaluation time
    pub async fn update(
        &self,
        session_id: &str,
        delta: f64,
        now: DateTime<Utc>,
        decay: &DecayPolicy,
        max_score: f64,
        limits: SessionLimits,
    ) -> ScoreUpdate {
        let mut session = self.lock(session_id, "", now, limits).await;
        session.touch(now);
        session.apply_delta(delta, now, decay, max_score)
    }

    /// Current view with the score decayed to `now`; nothing is mutated
    pub async fn peek(&self, session_id: &str, now: DateTime<Utc>, decay: &DecayPolicy) -> Option<SessionView> {
        let handle = self.sessions.read().get(session_id).cloned();
        match handle {
            Some(handle) => {
                let session = handle.lock().await;
                Some(session.view(now, decay))
            }
            None => self.tombstones.read().get(session_id).map(|contained_at| SessionView {
                session_id: session_id.to_string(),
                subject: String::new(),
                state: RoutingState::Decoy,
                score: 0.0,
                created_at: *contained_at,
                last_activity: *contained_at,
                last_evaluated: None,
                evaluations: 0,
                buffered_events: 0,
                contained: true,
            }),
        }
    }

    /// Logout. Returns false when the session was unknown.
    pub async fn end_session(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        let handle = self.sessions.read().get(session_id).cloned();
        let Some(handle) = handle else {
            return false;
        };

        let mut session = handle.clone().lock_owned().await;
        if session.is_retired() {
            return false;
        }
        // Tombstone before the handle leaves the map so no request can slip
        // in and re-create the id as REAL.
        if session.state().is_terminal() {
            self.tombstones.write().insert(session_id.to_string(), now);
        }
        {
            let mut sessions = self.sessions.write();
            if sessions.get(session_id).is_some_and(|h| Arc::ptr_eq(h, &handle)) {
                sessions.remove(session_id);
            }
        }
        session.retire();
        info!("Session {} ended in state {}", session_id, session.state());
        true
    }

    /// Drop sessions idle for longer than `idle_timeout` and expire old
    /// tombstones. Busy sessions are skipped until the next sweep.
    pub fn evict_idle(&self, now: DateTime<Utc>, idle_timeout: Duration, tombstone_horizon: Duration) -> usize {
        let mut evicted = 0;
        {
            let mut sessions = self.sessions.write();
            sessions.retain(|id, handle| {
                let Ok(mut session) = handle.clone().try_lock_owned() else {
                    return true;
                };
                if now - session.last_activity <= idle_timeout {
                    return true;
                }
                if session.state().is_terminal() {
                    self.tombstones.write().insert(id.clone(), now);
                }
                session.retire();
                evicted += 1;
                false
            });
        }

        let expired = {
            let mut tombstones = self.tombstones.write();
            let before = tombstones.len();
            tombstones.retain(|_, contained_at| now - *contained_at <= tombstone_horizon);
            before - tombstones.len()
        };

        if evicted > 0 || expired > 0 {
            info!("Evicted {} idle sessions, expired {} tombstones", evicted, expired);
        }
        evicted
    }

    pub fn is_contained(&self, session_id: &str) -> bool {
        self.tombstones.read().contains_key(session_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn tombstone_count(&self) -> usize {
        self.tombstones.read().len()
    }

    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for handle in self.sessions.read().values() {
            match handle.try_lock() {
                Ok(session) => match session.state() {
                    RoutingState::Real => counts.real += 1,
                    RoutingState::Monitoring => counts.monitoring += 1,
                    RoutingState::Decoy => counts.decoy += 1,
                },
                Err(_) => counts.busy += 1,
            }
        }
        counts
    }
}
