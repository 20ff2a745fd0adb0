use std::collections::VecDeque;

use super::event::{OutcomeKind, StreamExitKind, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub submissions: SubmissionStats,
    pub submit_latency: LatencyStats,
    pub stream_latency: LatencyStats,
    pub stream_results: u64,
    pub duplicates: u64,
    pub stream_exit: Option<StreamExitKind>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionStats {
    pub total: u64,
    pub completed: u64,
    pub accepted: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

/// Nearest-rank percentile over an ascending slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

pub fn latency_stats(samples: &[f64]) -> LatencyStats {
    if samples.is_empty() {
        return LatencyStats::default();
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    LatencyStats {
        count: sorted.len() as u64,
        min_ms: sorted[0],
        mean_ms: sorted.iter().sum::<f64>() / sorted.len() as f64,
        p50_ms: percentile(&sorted, 50.0),
        p95_ms: percentile(&sorted, 95.0),
        max_ms: sorted[sorted.len() - 1],
    }
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut submit_samples = Vec::new();
    let mut stream_samples = Vec::new();

    for event in events {
        match event {
            TelemetryEvent::SegmentSubmitted { outcome, latency_ms, .. } => {
                snap.submissions.total += 1;
                match outcome {
                    OutcomeKind::Completed => snap.submissions.completed += 1,
                    OutcomeKind::Accepted => snap.submissions.accepted += 1,
                    OutcomeKind::Failed => snap.submissions.failed += 1,
                }
                submit_samples.push(*latency_ms);
            }
            TelemetryEvent::StreamResult { latency_ms, duplicate, .. } => {
                snap.stream_results += 1;
                if *duplicate {
                    snap.duplicates += 1;
                }
                stream_samples.push(*latency_ms);
            }
            TelemetryEvent::StreamExited(kind) => snap.stream_exit = Some(*kind),
        }
    }

    snap.submit_latency = latency_stats(&submit_samples);
    snap.stream_latency = latency_stats(&stream_samples);
    snap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_use_nearest_rank() {
        let stats = latency_stats(&[40.0, 10.0, 30.0, 20.0]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min_ms, 10.0);
        assert_eq!(stats.max_ms, 40.0);
        assert_eq!(stats.mean_ms, 25.0);
        assert_eq!(stats.p50_ms, 20.0);
        assert_eq!(stats.p95_ms, 40.0);
    }

    #[test]
    fn empty_samples_give_zeroed_stats() {
        assert_eq!(latency_stats(&[]), LatencyStats::default());
    }
}
