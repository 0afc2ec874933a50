//! Attack Scenarios
//!
//! Deterministic request streams that model known post-auth behaviours.
//! Used by the `scenario-replay` binary and by the integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::ValueEnum;

use crate::logic::session::RouteRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Rapid walk over many distinct endpoints
    #[value(name = "api_enumeration")]
    ApiEnumeration,
    /// Steady pace with ~30% sensitive routes
    #[value(name = "sensitive_sweep")]
    SensitiveSweep,
    /// Human-paced, mostly benign with occasional sensitive reads
    #[value(name = "slow_attacker")]
    SlowAttacker,
    /// Normal browsing, then a honeytoken endpoint
    #[value(name = "canary_trip")]
    CanaryTrip,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::ApiEnumeration,
        Scenario::SensitiveSweep,
        Scenario::SlowAttacker,
        Scenario::CanaryTrip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::ApiEnumeration => "api_enumeration",
            Scenario::SensitiveSweep => "sensitive_sweep",
            Scenario::SlowAttacker => "slow_attacker",
            Scenario::CanaryTrip => "canary_trip",
        }
    }

    pub fn requests(&self, session_id: &str, start: DateTime<Utc>) -> Vec<RouteRequest> {
        match self {
            Scenario::ApiEnumeration => api_enumeration(session_id, start),
            Scenario::SensitiveSweep => sensitive_sweep(session_id, start),
            Scenario::SlowAttacker => slow_attacker(session_id, start),
            Scenario::CanaryTrip => canary_trip(session_id, start),
        }
    }
}

/// Fixed start so replays are reproducible
pub fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

const SUBJECT: &str = "scenario-user";

fn request(session_id: &str, route: &str, at: DateTime<Utc>) -> RouteRequest {
    RouteRequest::new(session_id, SUBJECT, route, "GET", at)
}

/// 50 distinct non-sensitive routes, 200 ms apart (10 s)
pub fn api_enumeration(session_id: &str, start: DateTime<Utc>) -> Vec<RouteRequest> {
    (0..50)
        .map(|i| {
            let at = start + Duration::milliseconds(200 * i as i64);
            request(session_id, &format!("/api/catalog/{}", i), at)
        })
        .collect()
}

/// 50 requests over ~2 minutes, 3 of every 10 to sensitive routes
pub fn sensitive_sweep(session_id: &str, start: DateTime<Utc>) -> Vec<RouteRequest> {
    const SENSITIVE: [&str; 3] = ["/api/admin/settings", "/api/users/list", "/api/keys/rotate"];
    const NORMAL: [&str; 4] = ["/api/dashboard", "/api/profile", "/api/feed", "/api/documents"];
    const GAPS_MS: [i64; 5] = [2_000, 2_800, 2_200, 2_600, 2_400];

    let mut at = start;
    (0..50)
        .map(|i| {
            if i > 0 {
                at += Duration::milliseconds(GAPS_MS[(i - 1) % GAPS_MS.len()]);
            }
            let route = if i % 10 < 3 {
                SENSITIVE[i % SENSITIVE.len()]
            } else {
                NORMAL[i % NORMAL.len()]
            };
            request(session_id, route, at)
        })
        .collect()
}

/// 30 requests with 3.5-5 s gaps, every fifth one sensitive
pub fn slow_attacker(session_id: &str, start: DateTime<Utc>) -> Vec<RouteRequest> {
    const SENSITIVE: [&str; 2] = ["/api/users/me", "/api/keys/status"];
    const NORMAL: [&str; 4] = ["/api/profile", "/api/dashboard", "/api/documents", "/api/feed"];
    const GAPS_MS: [i64; 5] = [3_500, 4_500, 5_000, 4_000, 4_500];

    let mut at = start;
    (0..30)
        .map(|i| {
            if i > 0 {
                at += Duration::milliseconds(GAPS_MS[(i - 1) % GAPS_MS.len()]);
            }
            let route = if i % 5 == 4 {
                SENSITIVE[(i / 5) % SENSITIVE.len()]
            } else {
                NORMAL[i % NORMAL.len()]
            };
            request(session_id, route, at)
        })
        .collect()
}

/// Three ordinary reads, then the hidden export endpoint
pub fn canary_trip(session_id: &str, start: DateTime<Utc>) -> Vec<RouteRequest> {
    let routes = ["/api/profile", "/api/dashboard", "/api/documents", "/api/v1/export"];
    routes
        .iter()
        .enumerate()
        .map(|(i, route)| request(session_id, route, start + Duration::seconds(5 * i as i64)))
        .collect()
}
