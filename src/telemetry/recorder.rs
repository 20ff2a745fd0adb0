use std::collections::VecDeque;

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};
use crate::results::{ResultRecord, ResultSource};

const MAX_EVENTS: usize = 10_000;

#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(64),
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    /// Records every stream-delivered record in the final result set.
    pub fn record_stream_results(&mut self, records: &[ResultRecord]) {
        for record in records.iter().filter(|r| r.source == ResultSource::Stream) {
            self.record(TelemetryEvent::StreamResult {
                index: record.segment_index,
                latency_ms: record.latency_ms,
                duplicate: record.is_duplicate,
            });
        }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }
}
