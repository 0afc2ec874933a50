//! Route Catalog - route metadata lookup
//!
//! Marks routes as sensitive. Patterns starting with `^` are regular
//! expressions, everything else is a path prefix.

use regex::Regex;

use super::types::{normalize_route, Sensitivity};
use crate::logic::error::ConfigError;

/// Default sensitive prefixes (admin, keys, users, token and password flows)
pub const DEFAULT_SENSITIVE_ROUTES: &[&str] = &[
    "/admin",
    "/api/admin",
    "/api/keys",
    "/auth/token",
    "/password/reset",
    "/api/users",
    "/api/v1/admin",
    "/api/v1/keys",
    "/api/v1/users",
];

#[derive(Debug, Clone)]
pub enum RoutePattern {
    Prefix(String),
    Regex(Regex),
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = pattern.trim();
        if pattern.starts_with('^') {
            Regex::new(pattern)
                .map(RoutePattern::Regex)
                .map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
        } else if pattern.starts_with('/') {
            Ok(RoutePattern::Prefix(normalize_route(pattern).to_string()))
        } else {
            Err(ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source: regex::Error::Syntax("route prefixes must start with '/'".to_string()),
            })
        }
    }

    /// Prefixes match whole path segments: `/api/users` covers
    /// `/api/users/me` but not `/api/usersettings`.
    pub fn matches(&self, route: &str) -> bool {
        let route = normalize_route(route);
        match self {
            RoutePattern::Prefix(prefix) if prefix == "/" => true,
            RoutePattern::Prefix(prefix) => route
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
            RoutePattern::Regex(re) => re.is_match(route),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    sensitive: Vec<RoutePattern>,
}

impl RouteCatalog {
    pub fn compile(patterns: &[String]) -> Result<Self, ConfigError> {
        let sensitive = patterns
            .iter()
            .map(|p| RoutePattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sensitive })
    }

    /// `Some(Sensitive)` when the route matches a sensitive pattern
    pub fn classify(&self, route: &str) -> Option<Sensitivity> {
        self.sensitive
            .iter()
            .any(|p| p.matches(route))
            .then_some(Sensitivity::Sensitive)
    }

    pub fn len(&self) -> usize {
        self.sensitive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensitive.is_empty()
    }
}
