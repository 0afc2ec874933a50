//! Forensic sink abstraction
//!
//! Sinks are blocking and must be idempotent on `record_id`: the logger may
//! retry a record whose first append actually landed.

use std::collections::HashSet;

use parking_lot::Mutex;
use uuid::Uuid;

use super::record::{ForensicQuery, ForensicRecord};
use crate::logic::error::SinkError;

pub trait ForensicSink: Send + Sync {
    fn name(&self) -> &str;

    fn append(&self, record: &ForensicRecord) -> Result<(), SinkError>;

    fn query(&self, query: &ForensicQuery) -> Result<Vec<ForensicRecord>, SinkError>;
}

// ============================================================================
// MEMORY SINK
// ============================================================================

#[derive(Default)]
struct MemoryInner {
    records: Vec<ForensicRecord>,
    ids: HashSet<Uuid>,
}

/// Volatile sink for tests, demos and the `memory` deployment mode
#[derive(Default)]
pub struct MemorySink {
    inner: Mutex<MemoryInner>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<ForensicRecord> {
        self.inner.lock().records.clone()
    }
}

impl ForensicSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn append(&self, record: &ForensicRecord) -> Result<(), SinkError> {
        let mut inner = self.inner.lock();
        if inner.ids.insert(record.record_id) {
            inner.records.push(record.clone());
        }
        Ok(())
    }

    fn query(&self, query: &ForensicQuery) -> Result<Vec<ForensicRecord>, SinkError> {
        Ok(query.apply(self.inner.lock().records.iter()))
    }
}
