//! Rule Types
//!
//! Data structures only. Evaluation lives in `engine`.

use serde::{Deserialize, Serialize};

use crate::logic::features::Feature;

// ============================================================================
// OPERATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }

    pub fn apply(&self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Gt => value > threshold,
            Operator::Gte => value >= threshold,
            Operator::Lt => value < threshold,
            Operator::Lte => value <= threshold,
            Operator::Eq => value == threshold,
            Operator::Ne => value != threshold,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RULE CONFIG (as written in the config file)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    /// Feature name; resolved when the ruleset is compiled
    pub feature: String,
    pub operator: Operator,
    pub threshold: f64,
    pub weight: f64,
    #[serde(default)]
    pub description: String,
    /// Window must hold at least this many events for the rule to be eligible
    #[serde(default)]
    pub min_events: usize,
}

impl RuleConfig {
    pub fn new(id: &str, feature: Feature, operator: Operator, threshold: f64, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            feature: feature.as_str().to_string(),
            operator,
            threshold,
            weight,
            description: String::new(),
            min_events: 0,
        }
    }

    pub fn min_events(mut self, min_events: usize) -> Self {
        self.min_events = min_events;
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

// ============================================================================
// COMPILED RULE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub feature: Feature,
    pub operator: Operator,
    pub threshold: f64,
    pub weight: f64,
    pub description: String,
    pub min_events: usize,
}

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub delta: f64,
    /// Fired rule ids, in configuration order
    pub fired: Vec<String>,
}

impl RuleOutcome {
    pub fn fired(&self, id: &str) -> bool {
        self.fired.iter().any(|f| f == id)
    }
}
