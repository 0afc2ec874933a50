//! Event Buffer - Per-session activity window
//!
//! Bounded by a time horizon and a maximum event count.
//! Eviction is lazy: it runs on append and on snapshot.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use super::types::Event;

#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<Event>,
    horizon: Duration,
    max_events: usize,
}

impl EventBuffer {
    pub fn new(horizon: Duration, max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            horizon,
            max_events: max_events.max(1),
        }
    }

    /// Apply new bounds after a config reload. Takes effect on the next append/snapshot.
    pub fn reconfigure(&mut self, horizon: Duration, max_events: usize) {
        self.horizon = horizon;
        self.max_events = max_events.max(1);
    }

    /// Append an event, then evict by age (relative to this event) and by count
    pub fn record(&mut self, event: Event) {
        let newest = event.timestamp;
        self.events.push_back(event);
        self.evict_older_than(newest);
        while self.events.len() > self.max_events {
            self.events.pop_front();
        }
    }

    /// In-window events in insertion order
    pub fn snapshot(&mut self, now: DateTime<Utc>) -> &[Event] {
        self.evict_older_than(now);
        self.events.make_contiguous()
    }

    fn evict_older_than(&mut self, reference: DateTime<Utc>) {
        let Some(cutoff) = reference.checked_sub_signed(self.horizon) else {
            return;
        };
        // Parallel requests can arrive out of order, so scan the whole window.
        self.events.retain(|e| e.timestamp >= cutoff);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
