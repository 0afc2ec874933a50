//! Risk Module - cumulative per-session risk
//!
//! ## Structure
//! - `decay`: Decay functions (exponential, linear, table) + grace period
//! - `state`: SessionState, the owned per-session record
//! - `manager`: RiskScoreManager, session map + lifecycle

pub mod decay;
pub mod state;
pub mod manager;

pub use decay::{DecayConfig, DecayPoint, DecayPolicy};
pub use state::{ScoreUpdate, SessionState, SessionView};
pub use manager::{RiskScoreManager, SessionLimits, StateCounts};
