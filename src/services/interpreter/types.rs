use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::results::{ResultRecord, ResultSource};

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    pub target_language: String,
    pub translation_preset: String,
    pub overlap_duration: f64,
    pub enable_translation: bool,
}

impl CreateSessionRequest {
    pub fn new(target_language: &str, overlap_duration: f64) -> Self {
        Self {
            target_language: target_language.to_string(),
            translation_preset: format!("interpreter-to-{target_language}"),
            overlap_duration,
            enable_translation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    #[serde(default)]
    pub stream_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessRequest {
    pub audio_base64: String,
    pub audio_format: String,
    pub start_time: f64,
    pub end_time: f64,
    pub is_final: bool,
}

/// Transcription/translation payload, as returned by a `200` process call or
/// carried by a `segment` stream event.
///
/// Older backends used `deduplicated`/`original` and `translated`; all of
/// them are accepted here and collapsed by [`SegmentResult::text`] and
/// [`SegmentResult::translation`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmentResult {
    pub segment_index: Option<u32>,
    pub deduplicated_text: Option<String>,
    pub deduplicated: Option<String>,
    pub original: Option<String>,
    pub translated_text: Option<String>,
    pub translated: Option<String>,
    /// `null` and absent both mean "not a duplicate".
    pub is_duplicate: Option<bool>,
    pub latency_ms: Option<f64>,
}

fn first_non_empty(candidates: [&Option<String>; 3]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_default()
}

impl SegmentResult {
    pub fn text(&self) -> String {
        first_non_empty([&self.deduplicated_text, &self.deduplicated, &self.original])
    }

    pub fn translation(&self) -> String {
        first_non_empty([&self.translated_text, &self.translated, &None])
    }

    pub fn to_record(&self, segment_index: u32, source: ResultSource, latency_ms: f64) -> ResultRecord {
        ResultRecord {
            segment_index,
            source,
            original_text: self.text(),
            translated_text: self.translation(),
            is_duplicate: self.is_duplicate.unwrap_or(false),
            latency_ms,
        }
    }
}

/// Body of a `202` process response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AcceptedBody {
    #[serde(alias = "job_id")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Final text is in the response.
    Completed(SegmentResult),
    /// Text will arrive on the session stream.
    Accepted { tracking_id: Option<String> },
    Failed { status: u16, message: String },
}

impl ProcessOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessOutcome::Completed(_) => "completed",
            ProcessOutcome::Accepted { .. } => "accepted",
            ProcessOutcome::Failed { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResponse {
    /// Wall-clock time from request send to response status.
    pub latency: Duration,
    pub outcome: ProcessOutcome,
}

impl ProcessResponse {
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionSummary {
    pub total_segments: Option<u64>,
    pub total_duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EndSessionResponse {
    pub summary: Option<SessionSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_derives_preset_from_language() {
        let req = CreateSessionRequest::new("ja", 2.0);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["translation_preset"], "interpreter-to-ja");
        assert_eq!(json["enable_translation"], true);
        assert_eq!(json["overlap_duration"], 2.0);
    }

    #[test]
    fn legacy_field_names_collapse_to_canonical_text() {
        let legacy: SegmentResult =
            serde_json::from_str(r#"{"deduplicated": "", "original": "hola", "translated": "hi"}"#).unwrap();
        assert_eq!(legacy.text(), "hola");
        assert_eq!(legacy.translation(), "hi");

        let current: SegmentResult = serde_json::from_str(
            r#"{"deduplicated_text": "uno", "original": "uno dos", "translated_text": "one"}"#,
        )
        .unwrap();
        assert_eq!(current.text(), "uno");
        assert_eq!(current.translation(), "one");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let parsed: SegmentResult =
            serde_json::from_str(r#"{"segment_index": 3, "is_duplicate": true, "extra": [1, 2]}"#).unwrap();
        assert_eq!(parsed.segment_index, Some(3));
        assert_eq!(parsed.is_duplicate, Some(true));
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn null_duplicate_flag_is_not_a_duplicate() {
        let parsed: SegmentResult =
            serde_json::from_str(r#"{"segment_index": 0, "deduplicated_text": "hi", "is_duplicate": null}"#)
                .unwrap();
        let record = parsed.to_record(0, ResultSource::Stream, 0.0);
        assert!(!record.is_duplicate);
        assert_eq!(record.original_text, "hi");
    }

    #[test]
    fn end_response_without_summary_decodes() {
        let parsed: EndSessionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.summary.is_none());
    }
}
