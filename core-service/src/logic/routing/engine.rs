//! Routing Decision Engine
//!
//! Pure mapping of (current state, score, canary flag) to the next state.
//! Checks run in priority order; the first match wins.

use super::types::*;

pub fn decide(current: RoutingState, score: f64, canary: bool, thresholds: &Thresholds) -> Transition {
    let (to, reason) = if current.is_terminal() {
        (RoutingState::Decoy, TransitionReason::OneWayEscalationLock)
    } else if canary {
        (RoutingState::Decoy, TransitionReason::CanaryEscalation)
    } else if score >= thresholds.decoy {
        (RoutingState::Decoy, TransitionReason::ScoreAboveDecoy)
    } else if score >= thresholds.monitor {
        (RoutingState::Monitoring, TransitionReason::ScoreAboveMonitor)
    } else if current == RoutingState::Monitoring {
        (RoutingState::Real, TransitionReason::RecoveredBelowMonitor)
    } else {
        (RoutingState::Real, TransitionReason::BelowThreshold)
    };

    Transition { from: current, to, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn th() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn test_real_stays_real_below_monitor() {
        let t = decide(RoutingState::Real, 0.1, false, &th());
        assert_eq!(t.to, RoutingState::Real);
        assert_eq!(t.reason, TransitionReason::BelowThreshold);
        assert!(!t.changed());
    }

    #[test]
    fn test_escalation_boundaries_are_inclusive() {
        assert_eq!(decide(RoutingState::Real, 0.30, false, &th()).to, RoutingState::Monitoring);
        assert_eq!(decide(RoutingState::Real, 0.60, false, &th()).to, RoutingState::Decoy);
        assert_eq!(decide(RoutingState::Monitoring, 0.60, false, &th()).reason, TransitionReason::ScoreAboveDecoy);
    }

    #[test]
    fn test_monitoring_recovers() {
        let t = decide(RoutingState::Monitoring, 0.29, false, &th());
        assert_eq!(t.to, RoutingState::Real);
        assert_eq!(t.reason, TransitionReason::RecoveredBelowMonitor);
        assert!(t.changed());
    }

    #[test]
    fn test_canary_escalates_from_zero() {
        let t = decide(RoutingState::Real, 0.0, true, &th());
        assert_eq!(t.to, RoutingState::Decoy);
        assert_eq!(t.reason, TransitionReason::CanaryEscalation);
    }

    #[test]
    fn test_decoy_is_terminal() {
        for score in [0.0, 0.1, 0.5, 1.0] {
            for canary in [false, true] {
                let t = decide(RoutingState::Decoy, score, canary, &th());
                assert_eq!(t.to, RoutingState::Decoy);
                assert_eq!(t.reason, TransitionReason::OneWayEscalationLock);
            }
        }
    }

    #[test]
    fn test_upstreams() {
        assert_eq!(RoutingState::Real.upstream(), Upstream::Real);
        assert_eq!(RoutingState::Monitoring.upstream(), Upstream::Real);
        assert_eq!(RoutingState::Decoy.upstream(), Upstream::Decoy);
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(Thresholds::new(0.3, 0.6, 1.0).is_ok());
        assert!(Thresholds::new(0.6, 0.6, 1.0).is_err());
        assert!(Thresholds::new(0.3, 1.2, 1.0).is_err());
        assert!(Thresholds::new(-0.1, 0.6, 1.0).is_err());
        assert!(Thresholds::new(0.3, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_state_serde() {
        assert_eq!(serde_json::to_string(&RoutingState::Monitoring).unwrap(), "\"MONITORING\"");
        let s: RoutingState = serde_json::from_str("\"DECOY\"").unwrap();
        assert_eq!(s, RoutingState::Decoy);
    }
}
