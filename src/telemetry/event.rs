use serde::{Deserialize, Serialize};

use crate::services::interpreter::ProcessOutcome;
use crate::stream::ListenerExit;

// Allowed: indices, latencies, counts, enums
// Forbidden: transcript text, audio bytes

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SegmentSubmitted {
        index: u32,
        outcome: OutcomeKind,
        latency_ms: f64,
    },

    StreamResult {
        index: u32,
        latency_ms: f64,
        duplicate: bool,
    },

    StreamExited(StreamExitKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    Completed,
    Accepted,
    Failed,
}

impl From<&ProcessOutcome> for OutcomeKind {
    fn from(outcome: &ProcessOutcome) -> Self {
        match outcome {
            ProcessOutcome::Completed(_) => OutcomeKind::Completed,  // text STRIPPED
            ProcessOutcome::Accepted { .. } => OutcomeKind::Accepted,
            ProcessOutcome::Failed { .. } => OutcomeKind::Failed,      // message STRIPPED
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamExitKind {
    Ended,
    Closed,
    Failed,
    Cancelled,
}

impl From<&ListenerExit> for StreamExitKind {
    fn from(exit: &ListenerExit) -> Self {
        match exit {
            ListenerExit::Ended(_) => StreamExitKind::Ended,
            ListenerExit::Closed => StreamExitKind::Closed,
            ListenerExit::Failed(_) => StreamExitKind::Failed,
            ListenerExit::Cancelled => StreamExitKind::Cancelled,
        }
    }
}
