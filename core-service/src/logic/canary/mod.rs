//! Canary Detector
//!
//! Honeytoken endpoints that no legitimate client ever calls.
//! Independent of the rule pipeline: a hit is an unconditional
//! DECOY escalation.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::logic::error::ConfigError;
use crate::logic::session::Event;
use crate::logic::session::types::normalize_route;

/// Trap name reported for the deep-pagination trap
pub const PAGINATION_TRAP: &str = "deep_pagination";

// ============================================================================
// TRAP DEFINITIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanaryTrap {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub paths: Vec<String>,
}

impl CanaryTrap {
    pub fn new(name: &str, description: &str, paths: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Built-in traps: a hidden export endpoint and privilege routes
pub fn default_traps() -> Vec<CanaryTrap> {
    vec![
        CanaryTrap::new(
            "hidden_export_endpoint",
            "Undocumented bulk export endpoint",
            &["/api/v1/export", "/api/v1/export-summary"],
        ),
        CanaryTrap::new(
            "privilege_escalation",
            "Admin and role management surface not exposed to users",
            &["/api/v1/admin", "/api/v1/roles"],
        ),
    ]
}

// ============================================================================
// DETECTOR
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CanaryDetector {
    /// normalized path -> trap name
    paths: HashMap<String, String>,
    /// `page` query values above this trip the trap; `None` disables the check
    max_page: Option<u64>,
}

impl CanaryDetector {
    pub fn new(traps: &[CanaryTrap], max_page: Option<u64>) -> Result<Self, ConfigError> {
        let mut paths = HashMap::new();
        for trap in traps {
            if trap.name.trim().is_empty() {
                return Err(ConfigError::InvalidCanary("trap name must not be empty".to_string()));
            }
            if trap.paths.is_empty() {
                return Err(ConfigError::InvalidCanary(format!("trap '{}' has no paths", trap.name)));
            }
            for path in &trap.paths {
                if !path.starts_with('/') {
                    return Err(ConfigError::InvalidCanary(format!(
                        "trap '{}' path '{}' must start with '/'",
                        trap.name, path
                    )));
                }
                let key = normalize_route(path).to_string();
                if let Some(existing) = paths.insert(key, trap.name.clone()) {
                    if existing != trap.name {
                        return Err(ConfigError::InvalidCanary(format!(
                            "path '{}' claimed by both '{}' and '{}'",
                            path, existing, trap.name
                        )));
                    }
                }
            }
        }
        Ok(Self { paths, max_page })
    }

    /// Name of the trap this request springs, if any
    pub fn inspect(&self, route: &str, query: &BTreeMap<String, String>) -> Option<&str> {
        if let Some(name) = self.paths.get(normalize_route(route)) {
            return Some(name.as_str());
        }

        let limit = self.max_page?;
        let page = query.get("page")?.trim().parse::<u64>().ok()?;
        (page > limit).then_some(PAGINATION_TRAP)
    }

    /// Stateless check of a recorded event
    pub fn check(&self, event: &Event) -> bool {
        event.is_canary() || self.paths.contains_key(normalize_route(&event.route))
    }

    pub fn trap_count(&self) -> usize {
        self.paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::session::Sensitivity;
    use chrono::Utc;

    fn detector() -> CanaryDetector {
        CanaryDetector::new(&default_traps(), Some(100)).unwrap()
    }

    fn no_query() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_trap_paths() {
        let d = detector();
        assert_eq!(d.inspect("/api/v1/export", &no_query()), Some("hidden_export_endpoint"));
        assert_eq!(d.inspect("/api/v1/export/", &no_query()), Some("hidden_export_endpoint"));
        assert_eq!(d.inspect("/api/v1/roles", &no_query()), Some("privilege_escalation"));
        assert_eq!(d.inspect("/api/v1/exports", &no_query()), None);
        assert_eq!(d.inspect("/api/profile", &no_query()), None);
    }

    #[test]
    fn test_deep_pagination() {
        let d = detector();
        let mut query = BTreeMap::new();
        query.insert("page".to_string(), "100".to_string());
        assert_eq!(d.inspect("/api/documents", &query), None);

        query.insert("page".to_string(), "101".to_string());
        assert_eq!(d.inspect("/api/documents", &query), Some(PAGINATION_TRAP));

        query.insert("page".to_string(), "abc".to_string());
        assert_eq!(d.inspect("/api/documents", &query), None);
    }

    #[test]
    fn test_pagination_disabled() {
        let d = CanaryDetector::new(&default_traps(), None).unwrap();
        let mut query = BTreeMap::new();
        query.insert("page".to_string(), "5000".to_string());
        assert_eq!(d.inspect("/api/documents", &query), None);
    }

    #[test]
    fn test_check_event() {
        let d = detector();
        let now = Utc::now();
        assert!(d.check(&Event::new("s", now, "/api/v1/admin", "GET", Sensitivity::Normal)));
        assert!(d.check(&Event::new("s", now, "/api/documents", "GET", Sensitivity::Canary)));
        assert!(!d.check(&Event::new("s", now, "/api/documents", "GET", Sensitivity::Sensitive)));
    }

    #[test]
    fn test_invalid_traps() {
        let empty = CanaryTrap::new("t", "", &[]);
        assert!(CanaryDetector::new(&[empty], None).is_err());

        let relative = CanaryTrap::new("t", "", &["api/x"]);
        assert!(CanaryDetector::new(&[relative], None).is_err());

        let a = CanaryTrap::new("a", "", &["/x"]);
        let b = CanaryTrap::new("b", "", &["/x/"]);
        assert!(CanaryDetector::new(&[a, b], None).is_err());
    }
}
