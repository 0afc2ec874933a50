//! Forensic query filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use phantomshield_core::{ForensicQuery, ForensicRecord};

pub const MAX_QUERY_LIMIT: usize = 10_000;

/// Query string of `GET /api/v1/forensics`
#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_range"))]
pub struct ForensicsFilter {
    pub session_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 10000))]
    pub limit: Option<usize>,
}

fn validate_range(filter: &ForensicsFilter) -> Result<(), ValidationError> {
    match (filter.from, filter.to) {
        (Some(from), Some(to)) if from > to => Err(ValidationError::new("from_after_to")),
        _ => Ok(()),
    }
}

impl ForensicsFilter {
    /// Unbounded queries are capped at `MAX_QUERY_LIMIT`
    pub fn into_query(self) -> ForensicQuery {
        ForensicQuery {
            session_id: self.session_id.filter(|s| !s.is_empty()),
            from: self.from,
            to: self.to,
            limit: Some(self.limit.unwrap_or(MAX_QUERY_LIMIT)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForensicsResponse {
    pub count: usize,
    pub records: Vec<ForensicRecord>,
}
