//! Feature Extractor
//!
//! Pure function of (window snapshot, now). No I/O, no session state.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use super::vector::FeatureVector;
use crate::logic::clock::duration_secs;
use crate::logic::session::types::normalize_route;
use crate::logic::session::Event;

#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    horizon_secs: f64,
    min_rate_window_secs: f64,
}

impl FeatureExtractor {
    pub fn new(horizon: Duration, min_rate_window_secs: f64) -> Self {
        Self {
            horizon_secs: duration_secs(horizon).max(0.0),
            min_rate_window_secs: if min_rate_window_secs.is_finite() && min_rate_window_secs > 0.0 {
                min_rate_window_secs
            } else {
                1.0
            },
        }
    }

    pub fn extract(&self, events: &[Event], now: DateTime<Utc>) -> FeatureVector {
        if events.is_empty() {
            return FeatureVector::zero();
        }

        let n = events.len() as f64;

        let distinct: HashSet<&str> = events.iter().map(|e| normalize_route(&e.route)).collect();
        let sensitive = events.iter().filter(|e| e.is_sensitive()).count() as f64;
        let canary = events.iter().filter(|e| e.is_canary()).count() as f64;

        FeatureVector {
            route_diversity: distinct.len() as f64 / n,
            sensitive_ratio: sensitive / n,
            request_rate: n / self.rate_window(events, now),
            interval_variance: interval_variance(events),
            canary_hits: canary,
            event_count: n,
        }
        .sanitized()
    }

    fn rate_window(&self, events: &[Event], now: DateTime<Utc>) -> f64 {
        // Out-of-order arrivals mean the first slot is not always the oldest.
        let first = events.iter().map(|e| e.timestamp).min().unwrap_or(now);
        let elapsed = duration_secs(now - first).max(0.0);
        elapsed.min(self.horizon_secs).max(self.min_rate_window_secs)
    }
}

/// Population variance of consecutive gaps; 0 below three events
fn interval_variance(events: &[Event]) -> f64 {
    if events.len() < 3 {
        return 0.0;
    }

    let gaps: Vec<f64> = events
        .windows(2)
        .map(|w| duration_secs(w[1].timestamp - w[0].timestamp).max(0.0))
        .collect();

    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / gaps.len() as f64
}
