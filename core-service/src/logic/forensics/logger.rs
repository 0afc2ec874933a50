//! Forensic Logger
//!
//! Two write paths over one sink:
//! - `record_sync`: awaited inside the session's critical section, bounded
//!   by a timeout. Failure never changes the verdict; it raises an alert
//!   and hands the record to the background path.
//! - `record_async`: bounded queue drained by a worker that retries with
//!   exponential backoff.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::record::{ForensicQuery, ForensicRecord, ForensicStatus, SessionTimeline};
use super::sink::ForensicSink;
use crate::logic::error::SinkError;

// ============================================================================
// RETRY POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(20);
        let ms = self.initial_backoff_ms.saturating_mul(1u64 << exp);
        Duration::from_millis(ms.min(self.max_backoff_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 50,
            max_backoff_ms: 5_000,
        }
    }
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Default)]
struct Counters {
    durable: AtomicU64,
    queued: AtomicU64,
    written_async: AtomicU64,
    retries: AtomicU64,
    dropped: AtomicU64,
    alerts: AtomicU64,
    pending: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerStats {
    /// Records made durable on the synchronous path
    pub durable: u64,
    pub queued: u64,
    pub written_async: u64,
    pub retries: u64,
    /// Records given up on after exhausting retries or on a full queue
    pub dropped: u64,
    /// Synchronous write failures (each one logged as a FORENSIC ALERT)
    pub alerts: u64,
    pub pending: u64,
}

// ============================================================================
// LOGGER
// ============================================================================

pub struct ForensicLogger {
    sink: Arc<dyn ForensicSink>,
    tx: mpsc::Sender<ForensicRecord>,
    counters: Arc<Counters>,
    retry: Arc<RwLock<RetryPolicy>>,
}

impl ForensicLogger {
    /// Spawn the background writer. Must be called inside a tokio runtime.
    pub fn start(sink: Arc<dyn ForensicSink>, capacity: usize, retry: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let counters = Arc::new(Counters::default());
        let retry = Arc::new(RwLock::new(retry));

        tokio::spawn(run_worker(sink.clone(), rx, counters.clone(), retry.clone()));
        log::info!("Forensic logger started (sink: {}, queue: {})", sink.name(), capacity.max(1));

        Self { sink, tx, counters, retry }
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub fn set_retry_policy(&self, policy: RetryPolicy) {
        *self.retry.write() = policy;
    }

    /// Append before returning. Fails open on error or timeout.
    pub async fn record_sync(&self, record: ForensicRecord, timeout: Duration) -> ForensicStatus {
        let sink = self.sink.clone();
        let pending = record.clone();
        let write = tokio::task::spawn_blocking(move || sink.append(&pending));

        match tokio::time::timeout(timeout, write).await {
            Ok(Ok(Ok(()))) => {
                self.counters.durable.fetch_add(1, Ordering::Relaxed);
                ForensicStatus::Durable
            }
            Ok(Ok(Err(e))) => self.alert(record, e.to_string()),
            Ok(Err(e)) => self.alert(record, format!("writer task failed: {}", e)),
            Err(_) => self.alert(record, format!("write timed out after {}ms", timeout.as_millis())),
        }
    }

    fn alert(&self, record: ForensicRecord, reason: String) -> ForensicStatus {
        self.counters.alerts.fetch_add(1, Ordering::Relaxed);
        error!(
            "FORENSIC ALERT: synchronous write failed for session {} (record {}, {} -> {}): {}",
            record.session_id, record.record_id, record.previous_state, record.verdict, reason
        );
        // Sinks are idempotent, so a write that timed out but later lands is harmless.
        self.enqueue(record);
        ForensicStatus::Failed { reason }
    }

    /// Queue for the background writer
    pub fn record_async(&self, record: ForensicRecord) -> ForensicStatus {
        if self.enqueue(record) {
            ForensicStatus::Queued
        } else {
            ForensicStatus::Failed {
                reason: "forensic queue full".to_string(),
            }
        }
    }

    fn enqueue(&self, record: ForensicRecord) -> bool {
        self.counters.pending.fetch_add(1, Ordering::Relaxed);
        match self.tx.try_send(record) {
            Ok(()) => {
                self.counters.queued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                self.counters.pending.fetch_sub(1, Ordering::Relaxed);
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                let record = match e {
                    mpsc::error::TrySendError::Full(r) | mpsc::error::TrySendError::Closed(r) => r,
                };
                warn!(
                    "Forensic queue unavailable, dropping record {} for session {}",
                    record.record_id, record.session_id
                );
                false
            }
        }
    }

    pub async fn query(&self, query: ForensicQuery) -> Result<Vec<ForensicRecord>, SinkError> {
        let sink = self.sink.clone();
        tokio::task::spawn_blocking(move || sink.query(&query))
            .await
            .map_err(|e| SinkError::Unavailable(format!("query task failed: {}", e)))?
    }

    pub async fn timeline(&self, session_id: &str) -> Result<SessionTimeline, SinkError> {
        let records = self.query(ForensicQuery::session(session_id)).await?;
        Ok(SessionTimeline::from_records(session_id, &records))
    }

    pub fn stats(&self) -> LoggerStats {
        let c = &self.counters;
        LoggerStats {
            durable: c.durable.load(Ordering::Relaxed),
            queued: c.queued.load(Ordering::Relaxed),
            written_async: c.written_async.load(Ordering::Relaxed),
            retries: c.retries.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            alerts: c.alerts.load(Ordering::Relaxed),
            pending: c.pending.load(Ordering::Relaxed),
        }
    }

    /// Wait until the background queue has drained
    pub async fn wait_idle(&self) {
        while self.counters.pending.load(Ordering::Relaxed) > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

// ============================================================================
// BACKGROUND WRITER
// ============================================================================

async fn run_worker(
    sink: Arc<dyn ForensicSink>,
    mut rx: mpsc::Receiver<ForensicRecord>,
    counters: Arc<Counters>,
    retry: Arc<RwLock<RetryPolicy>>,
) {
    while let Some(record) = rx.recv().await {
        let mut attempt = 0u32;
        loop {
            let s = sink.clone();
            let r = record.clone();
            let result = match tokio::task::spawn_blocking(move || s.append(&r)).await {
                Ok(result) => result,
                Err(e) => Err(SinkError::Unavailable(format!("writer task failed: {}", e))),
            };

            match result {
                Ok(()) => {
                    counters.written_async.fetch_add(1, Ordering::Relaxed);
                    debug!("Forensic record {} written", record.record_id);
                    break;
                }
                Err(e) => {
                    let policy = *retry.read();
                    if attempt >= policy.max_retries {
                        counters.dropped.fetch_add(1, Ordering::Relaxed);
                        error!(
                            "Forensic record {} for session {} dropped after {} attempts: {}",
                            record.record_id,
                            record.session_id,
                            attempt + 1,
                            e
                        );
                        break;
                    }
                    attempt += 1;
                    counters.retries.fetch_add(1, Ordering::Relaxed);
                    let delay = policy.backoff(attempt);
                    warn!(
                        "Forensic write failed (attempt {}), retrying in {:?}: {}",
                        attempt, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
        counters.pending.fetch_sub(1, Ordering::Relaxed);
    }
    debug!("Forensic writer stopped");
}
