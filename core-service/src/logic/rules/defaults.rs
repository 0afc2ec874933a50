//! Built-in ruleset
//!
//! Weights are tuned so that a burst of enumeration lands in MONITORING,
//! sustained sensitive probing climbs past the monitor threshold within a
//! couple of minutes, and a slow human-paced mix stays well below DECOY.

use super::types::{Operator, RuleConfig};
use crate::logic::features::Feature;

/// Cap on one evaluation's combined rule contribution
pub const DEFAULT_MAX_RULE_DELTA: f64 = 0.5;

pub fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::new("rate-burst", Feature::RequestRate, Operator::Gt, 4.0, 0.10)
            .min_events(20)
            .describe("Sustained request rate above 4 req/s"),
        RuleConfig::new("rate-flood", Feature::RequestRate, Operator::Gt, 10.0, 0.20)
            .min_events(10)
            .describe("Request rate above 10 req/s"),
        RuleConfig::new("route-enumeration", Feature::RouteDiversity, Operator::Gte, 0.9, 0.15)
            .min_events(20)
            .describe("Almost every request hits a new route"),
        RuleConfig::new("sensitive-probing", Feature::SensitiveRatio, Operator::Gt, 0.25, 0.06)
            .min_events(10)
            .describe("More than a quarter of the window is sensitive routes"),
        RuleConfig::new("sensitive-touch", Feature::SensitiveRatio, Operator::Gt, 0.1, 0.01)
            .min_events(5)
            .describe("Repeated access to sensitive routes"),
        RuleConfig::new("automation-cadence", Feature::IntervalVariance, Operator::Lt, 0.001, 0.10)
            .min_events(15)
            .describe("Machine-regular inter-arrival times"),
        RuleConfig::new("canary-trap", Feature::CanaryHits, Operator::Gte, 1.0, 0.40)
            .describe("Honeytoken endpoint touched"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::RuleSet;

    #[test]
    fn test_defaults_compile() {
        let set = RuleSet::compile(&default_rules(), Some(DEFAULT_MAX_RULE_DELTA)).unwrap();
        assert_eq!(set.len(), 7);
        assert_eq!(set.rules()[0].id, "rate-burst");
    }
}
