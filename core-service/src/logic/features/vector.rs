//! Feature Vector - input to the rule engine
//!
//! Named fields, plus a `Feature` enum so rules can address a field by name.

use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 6;

// ============================================================================
// FEATURE NAMES
// ============================================================================

/// Addressable feature. Config names map 1:1 onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    RouteDiversity,
    SensitiveRatio,
    RequestRate,
    IntervalVariance,
    CanaryHits,
    EventCount,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::RouteDiversity,
        Feature::SensitiveRatio,
        Feature::RequestRate,
        Feature::IntervalVariance,
        Feature::CanaryHits,
        Feature::EventCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::RouteDiversity => "route_diversity",
            Feature::SensitiveRatio => "sensitive_ratio",
            Feature::RequestRate => "request_rate",
            Feature::IntervalVariance => "interval_variance",
            Feature::CanaryHits => "canary_hits",
            Feature::EventCount => "event_count",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// All values are finite and non-negative; the two ratios are in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Distinct routes / events
    pub route_diversity: f64,
    /// Sensitive events / events
    pub sensitive_ratio: f64,
    /// Events per second over the effective window
    pub request_rate: f64,
    /// Population variance of inter-arrival gaps (seconds²)
    pub interval_variance: f64,
    pub canary_hits: f64,
    pub event_count: f64,
}

impl FeatureVector {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::RouteDiversity => self.route_diversity,
            Feature::SensitiveRatio => self.sensitive_ratio,
            Feature::RequestRate => self.request_rate,
            Feature::IntervalVariance => self.interval_variance,
            Feature::CanaryHits => self.canary_hits,
            Feature::EventCount => self.event_count,
        }
    }

    pub fn is_zero(&self) -> bool {
        Feature::ALL.iter().all(|f| self.get(*f) == 0.0)
    }

    /// Replace anything non-finite or negative with 0 and clamp the ratios
    pub fn sanitized(mut self) -> Self {
        fn clean(v: f64) -> f64 {
            if v.is_finite() && v > 0.0 { v } else { 0.0 }
        }
        self.route_diversity = clean(self.route_diversity).min(1.0);
        self.sensitive_ratio = clean(self.sensitive_ratio).min(1.0);
        self.request_rate = clean(self.request_rate);
        self.interval_variance = clean(self.interval_variance);
        self.canary_hits = clean(self.canary_hits);
        self.event_count = clean(self.event_count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_round_trip() {
        for f in Feature::ALL {
            assert_eq!(Feature::from_name(f.as_str()), Some(f));
        }
        assert_eq!(Feature::from_name("cpu_usage"), None);
    }

    #[test]
    fn test_sanitized() {
        let v = FeatureVector {
            route_diversity: 1.5,
            sensitive_ratio: f64::NAN,
            request_rate: f64::INFINITY,
            interval_variance: -0.1,
            canary_hits: 2.0,
            event_count: 4.0,
        }
        .sanitized();

        assert_eq!(v.route_diversity, 1.0);
        assert_eq!(v.sensitive_ratio, 0.0);
        assert_eq!(v.request_rate, 0.0);
        assert_eq!(v.interval_variance, 0.0);
        assert_eq!(v.canary_hits, 2.0);
    }

    #[test]
    fn test_zero() {
        assert!(FeatureVector::zero().is_zero());
        assert_eq!(FeatureVector::zero().get(Feature::RequestRate), 0.0);
    }
}
