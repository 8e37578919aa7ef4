//! Analytics event sink used by the funnel.
//!
//! The funnel only needs append semantics: push a named event with some
//! structured data. Nothing here ever reads the queue back.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Constant source tag attached by the tracing sink so funnel events can be
/// told apart from other emitters downstream.
pub const EVENT_SOURCE: &str = "booking_funnel";

/// Append-only destination for funnel analytics events.
pub trait AnalyticsSink: Send + Sync {
    fn push(&self, event: &str, data: Value);
}

/// A single recorded analytics event.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event: String,
    pub data: Value,
    pub at: DateTime<Utc>,
}

/// In-memory recording sink. Clones share the same backing queue, so a test
/// can keep a handle and inspect what the funnel pushed.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<EventRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Event names only, in push order.
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }
}

impl AnalyticsSink for MemorySink {
    fn push(&self, event: &str, data: Value) {
        if let Ok(mut events) = self.events.lock() {
            events.push(EventRecord {
                event: event.to_string(),
                data,
                at: Utc::now(),
            });
        }
    }
}

/// Sink that forwards events to the tracing subscriber as structured logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn push(&self, event: &str, data: Value) {
        tracing::info!(target: "analytics", source = EVENT_SOURCE, event, %data, "analytics event");
    }
}
