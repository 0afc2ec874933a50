//! Inbound routing call

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use phantomshield_core::{RouteRequest, Sensitivity};

/// Body of `POST /api/v1/evaluate`.
///
/// The route itself is not validated here: a malformed route is still
/// scored (as a degraded event) so it counts against the session.
#[derive(Debug, Deserialize, Validate)]
pub struct EvaluateRequest {
    #[validate(length(min = 1, max = 256))]
    pub session_id: String,
    #[validate(length(min = 1, max = 256))]
    pub subject: String,
    #[validate(length(max = 2048))]
    pub route: String,
    #[serde(default)]
    #[validate(length(max = 16))]
    pub method: String,
    /// Defaults to the time the gateway received the call
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub sensitivity: Option<Sensitivity>,
}

impl EvaluateRequest {
    pub fn into_route_request(self, received_at: DateTime<Utc>) -> RouteRequest {
        RouteRequest {
            session_id: self.session_id,
            subject: self.subject,
            route: self.route,
            method: self.method,
            timestamp: self.timestamp.unwrap_or(received_at),
            query: self.query,
            sensitivity: self.sensitivity,
            received_at: Some(received_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    /// A live session existed and was ended
    pub ended: bool,
    /// Future requests on this id go to the decoy
    pub contained: bool,
}
