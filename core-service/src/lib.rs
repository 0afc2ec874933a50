//! PhantomShield Core - Session Risk Scoring & Decoy Routing Engine
//!
//! Post-authentication behavioral risk engine. Every authenticated request
//! is scored against the session's recent activity and routed either to the
//! real upstream or, once the session is contained, to the decoy upstream.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         PHANTOMSHIELD CORE                       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  RouteRequest                                                    │
//! │      │                                                           │
//! │      ▼                                                           │
//! │  ┌──────────┐   ┌──────────┐   ┌────────┐   ┌───────────────┐    │
//! │  │ Catalog  │──▶│  Event   │──▶│Features│──▶│  Rule Engine  │    │
//! │  │ + Canary │   │  Buffer  │   │        │   │  + Advisors   │    │
//! │  └──────────┘   └──────────┘   └────────┘   └───────┬───────┘    │
//! │                                                     ▼            │
//! │  ┌──────────────┐   ┌───────────────┐   ┌───────────────────┐    │
//! │  │  Forensics   │◀──│    Routing    │◀──│ Risk Score (decay)│    │
//! │  │ (sync/async) │   │ REAL/MON/DECOY│   │                   │    │
//! │  └──────────────┘   └───────────────┘   └───────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod constants;
pub mod logic;
pub mod scenarios;

pub use logic::config::{ConfigStore, ConfigWatcher, EngineConfig};
pub use logic::engine::{Decision, Engine, EngineStats};
pub use logic::error::{ConfigError, EngineError, SinkError};
pub use logic::forensics::{
    ForensicQuery, ForensicRecord, ForensicSink, ForensicStatus, JsonlSink, MemorySink,
    SessionTimeline, SqliteSink,
};
pub use logic::routing::{RoutingState, TransitionReason, Upstream};
pub use logic::session::{Event, RouteRequest, Sensitivity};
