#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use interpreter_probe::audio::{SegmentDescriptor, Transcoder};
use interpreter_probe::error::{ApiError, ProbeError, ProbeResult};
use interpreter_probe::services::interpreter::types::SegmentResult;
use interpreter_probe::services::interpreter::{
    EndSessionResponse, EventByteStream, InterpreterApi, ProcessOutcome, ProcessResponse, SessionInfo,
    SessionSummary,
};
use tokio::sync::mpsc;

/// Transcoder that reports a fixed duration and writes one byte per
/// millisecond of requested audio.
pub struct FakeTranscoder {
    pub duration: Option<f64>,
    pub extracted: Mutex<Vec<(f64, f64)>>,
}

impl FakeTranscoder {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            extracted: Mutex::new(Vec::new()),
        }
    }

    pub fn broken() -> Self {
        Self {
            duration: None,
            extracted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn probe_duration(&self, input: &Path) -> ProbeResult<f64> {
        self.duration
            .ok_or_else(|| ProbeError::DurationUnavailable(input.to_path_buf()))
    }

    async fn extract(&self, _input: &Path, start: f64, length: f64, output: &Path) -> ProbeResult<()> {
        self.extracted.lock().unwrap().push((start, length));
        let bytes = vec![0u8; (length * 1000.0).round() as usize];
        tokio::fs::write(output, bytes).await?;
        Ok(())
    }
}

/// Writes a placeholder input file; only its existence matters.
pub fn audio_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("input.m4a");
    std::fs::write(&path, b"fake").unwrap();
    path
}

pub fn sse(kind: &str, data: &str) -> Vec<u8> {
    format!("event: {kind}\ndata: {data}\n\n").into_bytes()
}

pub fn segment_event(index: u32, text: &str, translated: &str) -> Vec<u8> {
    sse(
        "segment",
        &format!(
            r#"{{"segment_index": {index}, "deduplicated_text": "{text}", "translated_text": "{translated}", "is_duplicate": false, "latency_ms": 250}}"#
        ),
    )
}

pub fn stream_of(chunks: Vec<Vec<u8>>) -> EventByteStream {
    futures_util::stream::iter(chunks.into_iter().map(Ok)).boxed()
}

/// Stream that yields `chunks` and then stays open forever.
pub fn open_stream_of(chunks: Vec<Vec<u8>>) -> EventByteStream {
    futures_util::stream::iter(chunks.into_iter().map(Ok))
        .chain(futures_util::stream::pending())
        .boxed()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessMode {
    /// Every segment answers `200` with text.
    Sync,
    /// Every segment answers `202` and its text is pushed on the stream.
    Async,
}

/// In-memory backend. Stream events are pushed through a channel so tests
/// control exactly what the listener sees.
pub struct FakeApi {
    pub mode: ProcessMode,
    pub create_status: Option<u16>,
    pub fail_segment: Option<u32>,
    /// Segment whose request errors out instead of returning a status.
    pub fail_request_at: Option<u32>,
    pub end_status: Option<u16>,
    pub send_ended_after_final: bool,
    pub opened_streams: AtomicUsize,
    pub ended_sessions: AtomicUsize,
    pub processed: Mutex<Vec<u32>>,
    stream_tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    stream_rx: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl FakeApi {
    pub fn new(mode: ProcessMode) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            mode,
            create_status: None,
            fail_segment: None,
            fail_request_at: None,
            end_status: None,
            send_ended_after_final: false,
            opened_streams: AtomicUsize::new(0),
            ended_sessions: AtomicUsize::new(0),
            processed: Mutex::new(Vec::new()),
            stream_tx: Mutex::new(Some(tx)),
            stream_rx: Mutex::new(Some(rx)),
        }
    }

    pub fn push(&self, chunk: Vec<u8>) {
        if let Some(tx) = self.stream_tx.lock().unwrap().as_ref() {
            let _ = tx.send(chunk);
        }
    }

    pub fn opened(&self) -> usize {
        self.opened_streams.load(Ordering::SeqCst)
    }

    pub fn ended(&self) -> usize {
        self.ended_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InterpreterApi for FakeApi {
    async fn create_session(&self, _target_language: &str, _overlap: f64) -> Result<SessionInfo, ApiError> {
        if let Some(status) = self.create_status {
            return Err(ApiError::UnexpectedStatus {
                operation: "create session",
                status,
                body: "nope".into(),
            });
        }
        Ok(SessionInfo {
            session_id: "sess-1".into(),
            stream_url: Some("/asr/v1/interpreter/sessions/sess-1/stream".into()),
        })
    }

    async fn process_segment(
        &self,
        _session_id: &str,
        segment: &SegmentDescriptor,
    ) -> Result<ProcessResponse, ApiError> {
        self.processed.lock().unwrap().push(segment.index);
        let latency = Duration::from_millis(5);

        if self.fail_request_at == Some(segment.index) {
            return Err(ApiError::SegmentAudio {
                path: segment.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            });
        }

        if self.fail_segment == Some(segment.index) {
            return Ok(ProcessResponse {
                latency,
                outcome: ProcessOutcome::Failed {
                    status: 500,
                    message: "boom".into(),
                },
            });
        }

        let text = format!("text {}", segment.index);
        let outcome = match self.mode {
            ProcessMode::Sync => ProcessOutcome::Completed(SegmentResult {
                segment_index: Some(segment.index),
                deduplicated_text: Some(text),
                translated_text: Some(format!("译 {}", segment.index)),
                ..SegmentResult::default()
            }),
            ProcessMode::Async => {
                self.push(segment_event(segment.index, &text, "async"));
                if segment.is_final && self.send_ended_after_final {
                    self.push(sse("ended", r#"{"summary": {"total_segments": 4, "total_duration": 10.0}}"#));
                }
                ProcessOutcome::Accepted {
                    tracking_id: Some(format!("task-{}", segment.index)),
                }
            }
        };
        Ok(ProcessResponse { latency, outcome })
    }

    async fn end_session(&self, _session_id: &str) -> Result<EndSessionResponse, ApiError> {
        self.ended_sessions.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.end_status {
            return Err(ApiError::UnexpectedStatus {
                operation: "end session",
                status,
                body: "gone".into(),
            });
        }
        Ok(EndSessionResponse {
            summary: Some(SessionSummary {
                total_segments: Some(4),
                total_duration: Some(10.0),
            }),
        })
    }

    async fn open_stream(&self, _session_id: &str) -> Result<EventByteStream, ApiError> {
        self.opened_streams.fetch_add(1, Ordering::SeqCst);
        let rx = self.stream_rx.lock().unwrap().take();
        let Some(rx) = rx else {
            return Ok(futures_util::stream::empty().boxed());
        };
        Ok(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (Ok(chunk), rx))
        })
        .boxed())
    }
}
