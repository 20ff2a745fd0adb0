//! Run telemetry: submission outcomes and latencies.
//!
//! Telemetry is a read-only side layer. Nothing in the run reads it to make
//! decisions, and events never carry transcript text or audio.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{OutcomeKind, StreamExitKind, TelemetryEvent};
pub use metrics::{LatencyStats, TelemetrySnapshot};
pub use recorder::TelemetryRecorder;
