use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ProbeError, ProbeResult};

pub const DEFAULT_BASE_URL: &str = "https://auth.xiaojinpro.com";
pub const DEFAULT_TARGET_LANGUAGE: &str = "zh";
pub const DEFAULT_SEGMENT_DURATION_SECS: f64 = 4.0;
pub const DEFAULT_OVERLAP_SECS: f64 = 2.0;
pub const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_millis(500);

/// Time given to the event stream to connect before the first submission.
pub const STREAM_CONNECT_GRACE: Duration = Duration::from_secs(1);
/// Time given to trailing stream results after the last submission.
pub const STREAM_TRAILING_GRACE: Duration = Duration::from_secs(5);

/// Window geometry for slicing the input recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterConfig {
    pub segment_duration: f64,
    pub overlap: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            segment_duration: DEFAULT_SEGMENT_DURATION_SECS,
            overlap: DEFAULT_OVERLAP_SECS,
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> ProbeResult<()> {
        if !self.segment_duration.is_finite() || self.segment_duration <= 0.0 {
            return Err(ProbeError::InvalidConfig(format!(
                "segment duration must be positive, got {}",
                self.segment_duration
            )));
        }
        if !self.overlap.is_finite() || self.overlap < 0.0 {
            return Err(ProbeError::InvalidConfig(format!(
                "overlap must be non-negative, got {}",
                self.overlap
            )));
        }
        if self.overlap >= self.segment_duration {
            tracing::warn!(
                "Overlap {:.2}s >= segment duration {:.2}s; segments carry little new audio",
                self.overlap,
                self.segment_duration
            );
        }
        Ok(())
    }
}

/// Everything one run needs, threaded explicitly into the orchestrator.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub audio_path: PathBuf,
    pub base_url: String,
    pub target_language: String,
    pub use_stream: bool,
    pub submit_delay: Duration,
    pub connect_grace: Duration,
    pub trailing_grace: Duration,
    pub segmenter: SegmenterConfig,
}

impl RunConfig {
    pub fn new(audio_path: impl Into<PathBuf>) -> Self {
        Self {
            audio_path: audio_path.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            use_stream: true,
            submit_delay: DEFAULT_SUBMIT_DELAY,
            connect_grace: STREAM_CONNECT_GRACE,
            trailing_grace: STREAM_TRAILING_GRACE,
            segmenter: SegmenterConfig::default(),
        }
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> ProbeResult<()> {
        if !self.audio_path.exists() {
            return Err(ProbeError::AudioNotFound(self.audio_path.clone()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ProbeError::InvalidConfig("base URL is empty".into()));
        }
        if self.target_language.trim().is_empty() {
            return Err(ProbeError::InvalidConfig("target language is empty".into()));
        }
        self.segmenter.validate()
    }

    /// Converts a user-facing seconds value into a pacing delay.
    pub fn delay_from_secs(secs: f64) -> ProbeResult<Duration> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(ProbeError::InvalidConfig(format!(
                "delay must be a non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
