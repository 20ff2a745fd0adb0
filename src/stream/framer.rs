use serde_json::{Map, Value};
use tracing::debug;

const BLOCK_TERMINATOR: &[u8] = b"\n\n";

/// Payload of one framed event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A JSON object. Empty `data` decodes as an empty object.
    Json(Map<String, Value>),
    /// Anything that is not a JSON object, kept verbatim.
    Raw(String),
}

/// One complete `event:`/`data:` block, before type-specific decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub kind: String,
    pub payload: EventPayload,
}

/// Incremental text/event-stream framer.
///
/// Bytes are buffered until a blank line closes a block. Output does not
/// depend on how the transport chunks the input: splitting happens on raw
/// bytes (so multi-byte characters may straddle chunks) and carriage returns
/// are dropped on ingest (so `\r\n` endings may straddle chunks too).
#[derive(Debug, Default)]
pub struct EventFramer {
    buffer: Vec<u8>,
}

impl EventFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every event it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        // Bytes already buffered hold no terminator, except possibly one
        // completed by the first new byte.
        let mut scan_from = self.buffer.len().saturating_sub(BLOCK_TERMINATOR.len() - 1);
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(offset) = self.buffer[scan_from..]
            .windows(BLOCK_TERMINATOR.len())
            .position(|w| w == BLOCK_TERMINATOR)
        {
            let pos = scan_from + offset;
            scan_from = 0;
            let block: Vec<u8> = self.buffer.drain(..pos + BLOCK_TERMINATOR.len()).collect();
            let text = String::from_utf8_lossy(&block[..pos]);
            match parse_block(&text) {
                Some(event) => events.push(event),
                None if !text.trim().is_empty() => debug!("Dropped untyped stream block: {:?}", text),
                None => {}
            }
        }
        events
    }

    /// Bytes of an unfinished block still waiting for its terminator.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Parses one block. Blocks without an `event:` line yield nothing.
pub fn parse_block(text: &str) -> Option<RawEvent> {
    let mut kind = String::new();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if let Some(rest) = line.strip_prefix("event:") {
            kind = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim());
        }
        // `:` comments and unknown fields are ignored
    }

    if kind.is_empty() {
        return None;
    }

    let data = data_lines.join("\n");
    let payload = if data.is_empty() {
        EventPayload::Json(Map::new())
    } else {
        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(map)) => EventPayload::Json(map),
            _ => EventPayload::Raw(data),
        }
    };

    Some(RawEvent { kind, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_split_across_pushes_is_found() {
        let mut framer = EventFramer::new();
        assert!(framer.push(b"event: ready\ndata: {}\n").is_empty());
        let events = framer.push(b"\nevent: heartbeat\n\n");
        let kinds: Vec<&str> = events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["ready", "heartbeat"]);
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn long_block_in_small_chunks_emits_once() {
        let payload = "x".repeat(50_000);
        let block = format!("event: segment\ndata: {{\"deduplicated_text\": \"{payload}\"}}\n\n");
        let mut framer = EventFramer::new();

        let mut events = Vec::new();
        for chunk in block.as_bytes().chunks(3) {
            events.extend(framer.push(chunk));
        }

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0].payload, EventPayload::Json(map) if map["deduplicated_text"] == payload.as_str()));
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn keeps_remainder_between_pushes() {
        let mut framer = EventFramer::new();
        let events = framer.push(b"event: ready\ndata: {}\n\nevent: heart");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "ready");
        assert_eq!(framer.pending_len(), "event: heart".len());

        let events = framer.push(b"beat\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "heartbeat");
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn comment_lines_are_ignored() {
        let event = parse_block(": keep-alive\nevent: error\ndata: {\"message\": \"x\"}").unwrap();
        assert_eq!(event.kind, "error");
        match event.payload {
            EventPayload::Json(map) => assert_eq!(map["message"], "x"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn multiple_data_lines_are_joined() {
        let event = parse_block("event: note\ndata: first\ndata: second").unwrap();
        assert_eq!(event.payload, EventPayload::Raw("first\nsecond".into()));
    }

    #[test]
    fn non_object_json_is_kept_raw() {
        let event = parse_block("event: segment\ndata: [1, 2]").unwrap();
        assert_eq!(event.payload, EventPayload::Raw("[1, 2]".into()));
    }
}
