//! Forensics Module - durable decision trail
//!
//! Every evaluation that starts or ends in MONITORING/DECOY is written
//! synchronously; REAL evaluations are sampled and written in the background.
//!
//! ## Structure
//! - `record`: ForensicRecord, ForensicStatus, ForensicQuery, SessionTimeline
//! - `sink`: ForensicSink trait + in-memory sink
//! - `sqlite`: SQLite sink (indexed, idempotent on record id)
//! - `jsonl`: Append-only JSONL sink with size rotation
//! - `logger`: Sync/async write paths, retry queue, alert counters

pub mod record;
pub mod sink;
pub mod sqlite;
pub mod jsonl;
pub mod logger;


pub use record::{ForensicQuery, ForensicRecord, ForensicStatus, SessionTimeline, TimelineTransition};
pub use sink::{ForensicSink, MemorySink};
pub use sqlite::SqliteSink;
pub use jsonl::JsonlSink;
pub use logger::{ForensicLogger, LoggerStats, RetryPolicy};
