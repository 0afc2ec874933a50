//! Routing Module - verdict state machine
//!
//! REAL -> MONITORING -> DECOY, with DECOY terminal.
//!
//! ## Structure
//! - `types`: RoutingState, Upstream, TransitionReason, Thresholds (no logic)
//! - `engine`: The `decide` function

pub mod types;
pub mod engine;

pub use types::{RoutingState, Thresholds, Transition, TransitionReason, Upstream};
pub use engine::decide;
