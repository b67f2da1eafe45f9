//! Lifecycle trace recorded during a simulation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Trace event for one step of a simulated submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Unique event identifier.
    pub id: String,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Event payload.
    pub payload: Value,
}

/// Types of trace events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Hooks were installed on the form.
    Installed,
    /// Caller invoked submit.
    SubmitCalled,
    /// Before-submit hook ran.
    BeforeSubmit,
    /// Engine validator ran.
    Validation,
    /// Engine submit handler ran.
    EngineSubmit,
    /// Submit call returned to the caller.
    SubmitReturned,
    /// A pending validator or handler result was resolved.
    Settled,
    /// After-submit-succeeded hook ran.
    AfterSubmitSucceeded,
    /// After-submit-failed hook ran.
    AfterSubmitFailed,
    /// Hooks were removed from the form.
    Uninstalled,
}

impl EventType {
    /// Snake-case label, as serialized.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::SubmitCalled => "submit_called",
            Self::BeforeSubmit => "before_submit",
            Self::Validation => "validation",
            Self::EngineSubmit => "engine_submit",
            Self::SubmitReturned => "submit_returned",
            Self::Settled => "settled",
            Self::AfterSubmitSucceeded => "after_submit_succeeded",
            Self::AfterSubmitFailed => "after_submit_failed",
            Self::Uninstalled => "uninstalled",
        }
    }
}

/// Shared append-only event log. Clones append to the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl Recorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event_type: EventType, payload: Value) {
        let event = TraceEvent {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            payload,
        };
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of all events so far.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event types in order, without payloads.
    #[must_use]
    pub fn kinds(&self) -> Vec<EventType> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}
