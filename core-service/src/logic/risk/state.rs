//! Per-session state
//!
//! Owned by the score manager, mutated only while the session's mutex is held.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decay::DecayPolicy;
use crate::logic::routing::RoutingState;
use crate::logic::session::EventBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub previous_score: f64,
    /// Previous score after decay, before the delta
    pub decayed_score: f64,
    pub new_score: f64,
    pub previous_state: RoutingState,
}

/// Read-only snapshot for status endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub subject: String,
    pub state: RoutingState,
    /// Decayed to the time of the read
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub last_evaluated: Option<DateTime<Utc>>,
    pub evaluations: u64,
    pub buffered_events: usize,
    pub contained: bool,
}

#[derive(Debug)]
pub struct SessionState {
    pub session_id: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub last_evaluated: Option<DateTime<Utc>>,
    pub score: f64,
    pub buffer: EventBuffer,
    pub evaluations: u64,
    state: RoutingState,
    /// Set once the session is removed from the map; holders must re-resolve
    retired: bool,
}

impl SessionState {
    pub fn new(session_id: &str, subject: &str, now: DateTime<Utc>, buffer: EventBuffer) -> Self {
        Self {
            session_id: session_id.to_string(),
            subject: subject.to_string(),
            created_at: now,
            last_activity: now,
            last_evaluated: None,
            score: 0.0,
            buffer,
            evaluations: 0,
            state: RoutingState::Real,
            retired: false,
        }
    }

    /// Session re-created under a contained id
    pub fn contained(session_id: &str, subject: &str, now: DateTime<Utc>, buffer: EventBuffer) -> Self {
        let mut state = Self::new(session_id, subject, now, buffer);
        state.state = RoutingState::Decoy;
        state
    }

    pub fn state(&self) -> RoutingState {
        self.state
    }

    /// Returns false when the move would leave DECOY
    pub fn set_state(&mut self, next: RoutingState) -> bool {
        if self.state.is_terminal() && !next.is_terminal() {
            return false;
        }
        self.state = next;
        true
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// Decay to `now`, add `delta`, clamp to [0, max_score].
    ///
    /// The evaluation clock never moves backwards, so a late timestamp
    /// cannot make the next update decay the same interval twice.
    pub fn apply_delta(&mut self, delta: f64, now: DateTime<Utc>, decay: &DecayPolicy, max_score: f64) -> ScoreUpdate {
        let previous_score = self.score;
        let decayed_score = match self.last_evaluated {
            Some(last) => decay.apply(previous_score, now - last),
            None => previous_score,
        };

        let delta = if delta.is_finite() { delta } else { 0.0 };
        let new_score = (decayed_score + delta).clamp(0.0, max_score);

        self.score = new_score;
        self.last_evaluated = Some(match self.last_evaluated {
            Some(last) if last > now => last,
            _ => now,
        });
        self.evaluations += 1;

        ScoreUpdate {
            previous_score,
            decayed_score,
            new_score,
            previous_state: self.state,
        }
    }

    /// Decayed score without touching state
    pub fn peek_score(&self, now: DateTime<Utc>, decay: &DecayPolicy) -> f64 {
        match self.last_evaluated {
            Some(last) => decay.apply(self.score, now - last),
            None => self.score,
        }
    }

    pub fn view(&self, now: DateTime<Utc>, decay: &DecayPolicy) -> SessionView {
        SessionView {
            session_id: self.session_id.clone(),
            subject: self.subject.clone(),
            state: self.state,
            score: self.peek_score(now, decay),
            created_at: self.created_at,
            last_activity: self.last_activity,
            last_evaluated: self.last_evaluated,
            evaluations: self.evaluations,
            buffered_events: self.buffer.len(),
            contained: self.state.is_terminal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    fn fresh() -> SessionState {
        SessionState::new("s1", "alice", t0(), EventBuffer::new(Duration::seconds(300), 100))
    }

    #[test]
    fn test_apply_delta_decays_then_adds() {
        let decay = DecayPolicy::default();
        let mut s = fresh();
        s.apply_delta(0.4, t0(), &decay, 1.0);

        let update = s.apply_delta(0.1, t0() + Duration::seconds(300), &decay, 1.0);
        assert!((update.decayed_score - 0.2).abs() < 1e-12);
        assert!((update.new_score - 0.3).abs() < 1e-12);
        assert_eq!(s.evaluations, 2);
    }

    #[test]
    fn test_clamped_to_max_score() {
        let mut s = fresh();
        let update = s.apply_delta(5.0, t0(), &DecayPolicy::default(), 1.0);
        assert_eq!(update.new_score, 1.0);
    }

    #[test]
    fn test_zero_delta_same_instant_is_idempotent() {
        let decay = DecayPolicy::default();
        let mut s = fresh();
        s.apply_delta(0.5, t0(), &decay, 1.0);

        let later = t0() + Duration::seconds(42);
        let once = s.apply_delta(0.0, later, &decay, 1.0).new_score;
        let twice = s.apply_delta(0.0, later, &decay, 1.0).new_score;
        assert_eq!(once.to_bits(), twice.to_bits());
    }

    #[test]
    fn test_late_timestamp_does_not_rewind_clock() {
        let decay = DecayPolicy::default();
        let mut s = fresh();
        s.apply_delta(0.5, t0() + Duration::seconds(10), &decay, 1.0);
        let update = s.apply_delta(0.0, t0(), &decay, 1.0);

        assert_eq!(update.decayed_score, 0.5);
        assert_eq!(s.last_evaluated, Some(t0() + Duration::seconds(10)));
    }

    #[test]
    fn test_decoy_cannot_be_left() {
        let mut s = fresh();
        assert!(s.set_state(RoutingState::Monitoring));
        assert!(s.set_state(RoutingState::Decoy));
        assert!(!s.set_state(RoutingState::Real));
        assert!(!s.set_state(RoutingState::Monitoring));
        assert_eq!(s.state(), RoutingState::Decoy);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let decay = DecayPolicy::default();
        let mut s = fresh();
        s.apply_delta(0.4, t0(), &decay, 1.0);

        let peeked = s.peek_score(t0() + Duration::seconds(600), &decay);
        assert!((peeked - 0.1).abs() < 1e-12);
        assert_eq!(s.score, 0.4);
        assert_eq!(s.last_evaluated, Some(t0()));
    }
}
