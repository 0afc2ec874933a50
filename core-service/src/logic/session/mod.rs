//! Session Module
//!
//! Raw activity for one authenticated session.
//!
//! ## Structure
//! - `types`: Event, Sensitivity, RouteRequest (no logic)
//! - `buffer`: Bounded, time-windowed event store
//! - `catalog`: Route metadata lookup (sensitivity classification)

pub mod types;
pub mod buffer;
pub mod catalog;

pub use types::{Event, RouteRequest, Sensitivity, UNKNOWN_ROUTE, is_well_formed_route};
pub use buffer::EventBuffer;
pub use catalog::{RouteCatalog, RoutePattern};
