//! Rule Engine
//!
//! One interpreter over declarative (feature, operator, threshold, weight)
//! tuples. Pure: same vector in, same outcome out.

use std::collections::HashSet;

use super::types::*;
use crate::logic::error::ConfigError;
use crate::logic::features::{Feature, FeatureVector};

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    max_delta: Option<f64>,
}

impl RuleSet {
    /// Validate and resolve feature names. Order is preserved.
    pub fn compile(configs: &[RuleConfig], max_delta: Option<f64>) -> Result<Self, ConfigError> {
        if let Some(cap) = max_delta {
            if !cap.is_finite() || cap < 0.0 {
                return Err(ConfigError::InvalidRule {
                    rule: "<ruleset>".to_string(),
                    reason: format!("max_delta must be a finite non-negative number, got {}", cap),
                });
            }
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(configs.len());

        for cfg in configs {
            if cfg.id.trim().is_empty() {
                return Err(ConfigError::InvalidRule {
                    rule: cfg.id.clone(),
                    reason: "rule id must not be empty".to_string(),
                });
            }
            if !seen.insert(cfg.id.as_str()) {
                return Err(ConfigError::DuplicateRule(cfg.id.clone()));
            }

            let feature = Feature::from_name(&cfg.feature).ok_or_else(|| ConfigError::UnknownFeature {
                rule: cfg.id.clone(),
                feature: cfg.feature.clone(),
            })?;

            if !cfg.weight.is_finite() || cfg.weight < 0.0 {
                return Err(ConfigError::InvalidRule {
                    rule: cfg.id.clone(),
                    reason: format!("weight must be a finite non-negative number, got {}", cfg.weight),
                });
            }
            if !cfg.threshold.is_finite() {
                return Err(ConfigError::InvalidRule {
                    rule: cfg.id.clone(),
                    reason: "threshold must be finite".to_string(),
                });
            }

            rules.push(Rule {
                id: cfg.id.clone(),
                feature,
                operator: cfg.operator,
                threshold: cfg.threshold,
                weight: cfg.weight,
                description: cfg.description.clone(),
                min_events: cfg.min_events,
            });
        }

        Ok(Self { rules, max_delta })
    }

    pub fn evaluate(&self, features: &FeatureVector) -> RuleOutcome {
        let events = features.event_count;
        let mut outcome = RuleOutcome::default();

        for rule in &self.rules {
            if events < rule.min_events as f64 {
                continue;
            }
            if rule.operator.apply(features.get(rule.feature), rule.threshold) {
                outcome.delta += rule.weight;
                outcome.fired.push(rule.id.clone());
            }
        }

        if let Some(cap) = self.max_delta {
            outcome.delta = outcome.delta.min(cap);
        }
        outcome
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn max_delta(&self) -> Option<f64> {
        self.max_delta
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
