//! Config Module - engine tuning
//!
//! ## Structure
//! - `types`: EngineConfig (serde document) + presets
//! - `compiled`: CompiledConfig, the validated snapshot evaluations run against
//! - `store`: ConfigStore, atomic snapshot swap
//! - `watcher`: File-watch hot reload

pub mod types;
pub mod compiled;
pub mod store;
pub mod watcher;

#[cfg(test)]
mod tests;

pub use types::{CanaryConfig, EngineConfig, ForensicsConfig, RiskConfig, SessionConfig, WindowConfig};
pub use compiled::CompiledConfig;
pub use store::ConfigStore;
pub use watcher::ConfigWatcher;
