//! Session Types
//!
//! Core types for observed activity.
//! NO logic beyond small helpers - only data structures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Route recorded when the request carried no usable route.
pub const UNKNOWN_ROUTE: &str = "<unknown>";

// ============================================================================
// SENSITIVITY
// ============================================================================

/// Sensitivity class assigned by route metadata lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    /// Ordinary application traffic
    Normal,
    /// Privileged or data-rich routes
    Sensitive,
    /// Honeytoken route - no legitimate reason to touch it
    Canary,
}

impl Sensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Normal => "normal",
            Sensitivity::Sensitive => "sensitive",
            Sensitivity::Canary => "canary",
        }
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// EVENT
// ============================================================================

/// One observed request. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub route: String,
    pub method: String,
    pub sensitivity: Sensitivity,
}

impl Event {
    pub fn new(
        session_id: &str,
        timestamp: DateTime<Utc>,
        route: &str,
        method: &str,
        sensitivity: Sensitivity,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            timestamp,
            route: route.to_string(),
            method: method.to_uppercase(),
            sensitivity,
        }
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitivity == Sensitivity::Sensitive
    }

    pub fn is_canary(&self) -> bool {
        self.sensitivity == Sensitivity::Canary
    }
}

// ============================================================================
// ROUTE REQUEST (inbound call)
// ============================================================================

/// One authenticated HTTP request as handed over by the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub session_id: String,
    /// Subject from the (opaque) identity token
    pub subject: String,
    pub route: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    /// Query parameters (pagination traps read from here)
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Sensitivity from the HTTP layer's own route metadata, if it has any
    #[serde(default)]
    pub sensitivity: Option<Sensitivity>,
    /// When the HTTP layer received the call; bounds how far ahead `timestamp` may be
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl RouteRequest {
    pub fn new(
        session_id: &str,
        subject: &str,
        route: &str,
        method: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            subject: subject.to_string(),
            route: route.to_string(),
            method: method.to_string(),
            timestamp,
            query: BTreeMap::new(),
            sensitivity: None,
            received_at: None,
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }

    pub fn with_received_at(mut self, at: DateTime<Utc>) -> Self {
        self.received_at = Some(at);
        self
    }
}

/// A route is usable when it is a non-empty absolute path
pub fn is_well_formed_route(route: &str) -> bool {
    let route = route.trim();
    !route.is_empty() && route.starts_with('/')
}

/// Canonical form used for exact-match lookups (no trailing slash, no query)
pub fn normalize_route(route: &str) -> &str {
    let route = route.trim();
    let route = route.split('?').next().unwrap_or(route);
    if route.len() > 1 {
        route.trim_end_matches('/')
    } else {
        route
    }
}
