use serde::Deserialize;
use serde_json::{Map, Value};

use super::framer::{EventPayload, RawEvent};
use crate::services::interpreter::{SegmentResult, SessionSummary};

/// Typed session stream event. Consumed on decode, never retained.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Ready { session_id: Option<String> },
    Segment(SegmentResult),
    Error { message: Option<String> },
    Ended { summary: Option<SessionSummary> },
    Heartbeat,
    /// Event type this harness does not know about.
    Other { kind: String },
    /// Known type whose payload could not be decoded.
    Malformed { kind: String, detail: String },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ReadyPayload {
    session_id: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ErrorPayload {
    message: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct EndedPayload {
    summary: Option<SessionSummary>,
}

fn from_map<T: serde::de::DeserializeOwned>(map: &Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(map.clone())).map_err(|e| e.to_string())
}

impl StreamEvent {
    pub fn decode(raw: &RawEvent) -> StreamEvent {
        let kind = raw.kind.as_str();
        if kind == "heartbeat" {
            return StreamEvent::Heartbeat;
        }

        let map = match &raw.payload {
            EventPayload::Json(map) => map,
            EventPayload::Raw(text) => {
                return match kind {
                    "ready" | "segment" | "error" | "ended" => StreamEvent::Malformed {
                        kind: kind.to_string(),
                        detail: format!("non-JSON payload: {text}"),
                    },
                    _ => StreamEvent::Other { kind: kind.to_string() },
                };
            }
        };

        let decoded = match kind {
            "ready" => from_map::<ReadyPayload>(map).map(|p| StreamEvent::Ready { session_id: p.session_id }),
            "segment" => from_map::<SegmentResult>(map).map(StreamEvent::Segment),
            "error" => from_map::<ErrorPayload>(map).map(|p| StreamEvent::Error { message: p.message }),
            "ended" => from_map::<EndedPayload>(map).map(|p| StreamEvent::Ended { summary: p.summary }),
            _ => Ok(StreamEvent::Other { kind: kind.to_string() }),
        };

        decoded.unwrap_or_else(|detail| StreamEvent::Malformed { kind: kind.to_string(), detail })
    }
}
