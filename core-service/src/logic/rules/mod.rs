//! Rules Module - declarative risk rules
//!
//! ## Structure
//! - `types`: Operator, RuleConfig, Rule, RuleOutcome
//! - `engine`: RuleSet compile + evaluate
//! - `defaults`: Built-in ruleset

pub mod types;
pub mod engine;
pub mod defaults;

pub use types::{Operator, Rule, RuleConfig, RuleOutcome};
pub use engine::RuleSet;
pub use defaults::{default_rules, DEFAULT_MAX_RULE_DELTA};
