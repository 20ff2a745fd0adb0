use serde::{Deserialize, Serialize};

/// Which channel delivered a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultSource {
    /// `200` response to the process call.
    Sync,
    /// `segment` event on the session stream.
    Stream,
}

/// Canonical per-segment result, written identically by both channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub segment_index: u32,
    pub source: ResultSource,
    pub original_text: String,
    pub translated_text: String,
    pub is_duplicate: bool,
    pub latency_ms: f64,
}

impl ResultRecord {
    pub fn has_text(&self) -> bool {
        !self.original_text.is_empty()
    }
}
