use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::transcoder::{Transcoder, CLIP_FORMAT};
use crate::config::SegmenterConfig;
use crate::error::ProbeResult;

/// One planned window of the input recording, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentWindow {
    pub index: u32,
    /// Effective start, pulled back by the overlap for every window but the first.
    pub start_time: f64,
    pub end_time: f64,
    /// Audio shared with the previous window.
    pub overlap_duration: f64,
    pub is_final: bool,
}

impl SegmentWindow {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A materialized clip, ready for submission. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDescriptor {
    pub index: u32,
    pub path: PathBuf,
    pub start_time: f64,
    pub end_time: f64,
    pub overlap_duration: f64,
    pub duration: f64,
    pub size_bytes: u64,
    pub is_final: bool,
}

impl SegmentDescriptor {
    pub fn from_window(window: &SegmentWindow, path: PathBuf, size_bytes: u64) -> Self {
        Self {
            index: window.index,
            path,
            start_time: window.start_time,
            end_time: window.end_time,
            overlap_duration: window.overlap_duration,
            duration: window.duration(),
            size_bytes,
            is_final: window.is_final,
        }
    }
}

/// Pure window geometry.
///
/// Every window spans `segment_duration` from its effective start, and the
/// cursor advances to the window's end, so consecutive windows share
/// `overlap` seconds of audio. When the overlap swallows the whole window the
/// end is measured from the cursor instead, which keeps the cursor moving. A
/// zero-length input yields no windows.
pub fn plan_windows(total_duration: f64, config: &SegmenterConfig) -> Vec<SegmentWindow> {
    let mut windows = Vec::new();
    if config.segment_duration.is_nan() || config.segment_duration <= 0.0 || !total_duration.is_finite() {
        return windows;
    }

    let mut start_time = 0.0_f64;
    let mut index = 0u32;

    while start_time < total_duration {
        let effective_start = if index == 0 {
            0.0
        } else {
            (start_time - config.overlap).max(0.0)
        };
        let mut end_time = (effective_start + config.segment_duration).min(total_duration);
        if end_time <= start_time {
            end_time = (start_time + config.segment_duration).min(total_duration);
        }
        // float absorption on very long inputs
        if end_time <= start_time {
            break;
        }

        windows.push(SegmentWindow {
            index,
            start_time: effective_start,
            end_time,
            overlap_duration: start_time - effective_start,
            is_final: end_time >= total_duration,
        });

        start_time = end_time;
        index += 1;
    }

    windows
}

pub fn clip_file_name(index: u32) -> String {
    format!("segment_{index:03}.{CLIP_FORMAT}")
}

/// Slices a recording into overlapping clips through a [`Transcoder`].
pub struct Segmenter<T> {
    transcoder: T,
    config: SegmenterConfig,
}

impl<T: Transcoder> Segmenter<T> {
    pub fn new(transcoder: T, config: SegmenterConfig) -> Self {
        Self { transcoder, config }
    }

    /// Materializes every planned window of `input` into `output_dir`.
    pub async fn slice(&self, input: &Path, output_dir: &Path) -> ProbeResult<Vec<SegmentDescriptor>> {
        self.config.validate()?;

        let total = self.transcoder.probe_duration(input).await?;
        info!("Audio duration: {:.2}s", total);
        info!(
            "Segment duration: {}s, Overlap: {}s",
            self.config.segment_duration, self.config.overlap
        );

        let windows = plan_windows(total, &self.config);
        let mut segments = Vec::with_capacity(windows.len());

        for window in &windows {
            let path = output_dir.join(clip_file_name(window.index));
            self.transcoder
                .extract(input, window.start_time, window.duration(), &path)
                .await?;
            let size_bytes = tokio::fs::metadata(&path).await?.len();

            info!(
                "  Segment {}: {:.2}s - {:.2}s (overlap: {:.2}s, size: {} bytes)",
                window.index, window.start_time, window.end_time, window.overlap_duration, size_bytes
            );
            segments.push(SegmentDescriptor::from_window(window, path, size_bytes));
        }

        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_names_are_zero_padded() {
        assert_eq!(clip_file_name(7), "segment_007.aac");
        assert_eq!(clip_file_name(123), "segment_123.aac");
    }

    #[test]
    fn short_input_fits_in_one_final_window() {
        let windows = plan_windows(1.5, &SegmenterConfig::default());
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_time, 0.0);
        assert_eq!(windows[0].end_time, 1.5);
        assert_eq!(windows[0].overlap_duration, 0.0);
        assert!(windows[0].is_final);
    }

    #[test]
    fn invalid_geometry_plans_nothing() {
        let cfg = SegmenterConfig { segment_duration: 0.0, overlap: 0.0 };
        assert!(plan_windows(10.0, &cfg).is_empty());
        assert!(plan_windows(f64::NAN, &SegmenterConfig::default()).is_empty());
    }
}
