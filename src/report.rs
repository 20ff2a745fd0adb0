//! Console rendering of the final run report.

use std::fmt::Write;

use crate::results::ResultRecord;
use crate::services::interpreter::SessionSummary;
use crate::telemetry::{LatencyStats, TelemetrySnapshot};

const RULE_WIDTH: usize = 60;

fn latency_line(label: &str, stats: &LatencyStats) -> String {
    if stats.count == 0 {
        return format!("{label}: n/a");
    }
    format!(
        "{label}: n={} min={:.0}ms mean={:.0}ms p50={:.0}ms p95={:.0}ms max={:.0}ms",
        stats.count, stats.min_ms, stats.mean_ms, stats.p50_ms, stats.p95_ms, stats.max_ms
    )
}

/// Backend summary plus locally measured latencies. `local_segments` stands
/// in when the backend omits its own count.
pub fn render_summary(
    summary: Option<&SessionSummary>,
    local_segments: usize,
    telemetry: &TelemetrySnapshot,
) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let summary = summary.copied().unwrap_or_default();
    let total_segments = summary.total_segments.unwrap_or(local_segments as u64);

    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Session Summary");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total segments: {total_segments}");
    let _ = writeln!(out, "Total duration: {:.1}s", summary.total_duration.unwrap_or(0.0));
    let subs = &telemetry.submissions;
    let _ = writeln!(
        out,
        "Submitted: {} (completed {}, accepted {}, error {})",
        subs.total, subs.completed, subs.accepted, subs.failed
    );
    let _ = writeln!(out, "{}", latency_line("Submit latency", &telemetry.submit_latency));
    let _ = writeln!(out, "{}", latency_line("Stream latency", &telemetry.stream_latency));
    let _ = writeln!(out, "Duplicates: {}", telemetry.duplicates);
    let _ = write!(out, "{rule}");
    out
}

/// Every record in ascending index order.
pub fn render_transcripts(records: &[ResultRecord]) -> String {
    let mut sorted: Vec<&ResultRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.segment_index);

    let mut out = String::new();
    let _ = writeln!(out, "All Transcriptions:");
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for record in sorted {
        if record.is_duplicate {
            let _ = writeln!(out, "[{}] (duplicate)", record.segment_index);
        } else if record.has_text() {
            let _ = writeln!(out, "[{}] {}", record.segment_index, record.original_text);
            if !record.translated_text.is_empty() {
                let _ = writeln!(out, "    → {}", record.translated_text);
            }
        }
        out.push('\n');
    }
    out
}
