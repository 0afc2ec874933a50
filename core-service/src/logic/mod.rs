//! Logic Module - Engines
//!
//! Per-request pipeline: session buffer, feature extraction, canary traps,
//! rules, risk scoring, routing, forensics.
//!
//! ## Layout
//! - `session/` - Events, per-session buffer, route catalog
//! - `features/` - Feature vector + extractor
//! - `canary/` - Trap endpoint detection
//! - `rules/` - Declarative rule interpreter
//! - `risk/` - Decay and the per-session score manager
//! - `routing/` - REAL / MONITORING / DECOY state machine
//! - `forensics/` - Forensic records, sinks and the logger
//! - `config/` - Engine config, hot-swappable store, file watcher

pub mod advisor;
pub mod canary;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod forensics;
pub mod risk;
pub mod routing;
pub mod rules;
pub mod session;
