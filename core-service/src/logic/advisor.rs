//! Risk Advisors (Extensible)
//!
//! Pluggable advisory signals, e.g. a future anomaly classifier.
//! Advisors only nudge the score; they never pick a verdict, and their
//! combined contribution per evaluation is capped.

use crate::logic::features::FeatureVector;
use crate::logic::session::Event;

// ============================================================================
// ADVISOR TRAIT
// ============================================================================

pub trait RiskAdvisor: Send + Sync {
    fn name(&self) -> &str;

    /// Non-negative risk contribution for this evaluation, or `None` to abstain
    fn advise(&self, features: &FeatureVector, event: &Event) -> Option<f64>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Advice {
    pub delta: f64,
    /// `advisor:<name>` for each advisor that contributed
    pub contributors: Vec<String>,
}

/// Sum advisor contributions, capped at `max_delta`.
/// Negative or non-finite advice is ignored.
pub fn consult(advisors: &[Box<dyn RiskAdvisor>], features: &FeatureVector, event: &Event, max_delta: f64) -> Advice {
    let mut advice = Advice::default();
    for advisor in advisors {
        match advisor.advise(features, event) {
            Some(delta) if delta.is_finite() && delta > 0.0 => {
                advice.delta += delta;
                advice.contributors.push(format!("advisor:{}", advisor.name()));
            }
            Some(delta) if !delta.is_finite() || delta < 0.0 => {
                log::warn!("Advisor {} returned unusable delta {}, ignored", advisor.name(), delta);
            }
            _ => {}
        }
    }
    advice.delta = advice.delta.min(max_delta.max(0.0));
    advice
}
