use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::event::StreamEvent;
use super::framer::EventFramer;
use crate::error::ApiError;
use crate::results::{ResultSource, ResultStore};
use crate::services::interpreter::{InterpreterApi, SessionSummary};

/// Why the listener stopped. None of these is a failure of the run.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerExit {
    /// Server sent `ended`.
    Ended(Option<SessionSummary>),
    /// Server closed the connection.
    Closed,
    /// Connection or transport error, already logged.
    Failed(String),
    Cancelled,
}

const PREVIEW_CHARS: usize = 80;

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Drains one session stream into the shared result store.
pub struct StreamListener {
    store: ResultStore,
    token: CancellationToken,
    framer: EventFramer,
}

impl StreamListener {
    pub fn new(store: ResultStore, token: CancellationToken) -> Self {
        Self {
            store,
            token,
            framer: EventFramer::new(),
        }
    }

    /// Applies one decoded event. `Break` means the stream is over.
    pub fn dispatch(&self, event: StreamEvent) -> ControlFlow<ListenerExit> {
        match event {
            StreamEvent::Ready { session_id } => {
                info!("[SSE] Session ready: {}", session_id.as_deref().unwrap_or("?"));
            }
            StreamEvent::Segment(result) => {
                let Some(index) = result.segment_index else {
                    warn!("[SSE] Segment event without segment_index, skipped");
                    return ControlFlow::Continue(());
                };
                let latency = result.latency_ms.unwrap_or(0.0);
                let record = result.to_record(index, ResultSource::Stream, latency);

                if record.is_duplicate {
                    info!("[SSE] Segment {}: (duplicate)", index);
                } else {
                    info!("[SSE] Segment {} ({}ms):", index, latency);
                    if !record.original_text.is_empty() {
                        info!("  Text: {}...", preview(&record.original_text));
                    }
                    if !record.translated_text.is_empty() {
                        info!("  → {}...", preview(&record.translated_text));
                    }
                }
                self.store.upsert(record);
            }
            StreamEvent::Error { message } => {
                warn!("[SSE] Error: {}", message.as_deref().unwrap_or("(no message)"));
            }
            StreamEvent::Ended { summary } => {
                let shown = summary.unwrap_or_default();
                info!(
                    "[SSE] Session ended: {} segments, {:.1}s",
                    shown.total_segments.map_or("?".to_string(), |n| n.to_string()),
                    shown.total_duration.unwrap_or(0.0)
                );
                return ControlFlow::Break(ListenerExit::Ended(summary));
            }
            StreamEvent::Heartbeat => {}
            StreamEvent::Other { kind } => debug!("[SSE] Ignoring event type {}", kind),
            StreamEvent::Malformed { kind, detail } => {
                warn!("[SSE] Could not decode {} event: {}", kind, detail);
            }
        }
        ControlFlow::Continue(())
    }

    /// Feeds raw bytes through the framer and dispatches completed events.
    pub fn feed(&mut self, chunk: &[u8]) -> ControlFlow<ListenerExit> {
        for raw in self.framer.push(chunk) {
            if let ControlFlow::Break(exit) = self.dispatch(StreamEvent::decode(&raw)) {
                return ControlFlow::Break(exit);
            }
        }
        ControlFlow::Continue(())
    }

    /// Reads `stream` until it ends, fails, sends `ended`, or the token fires.
    /// An unfinished block left in the framer is discarded.
    pub async fn drain<S>(mut self, mut stream: S) -> ListenerExit
    where
        S: Stream<Item = Result<Vec<u8>, ApiError>> + Unpin,
    {
        let exit = loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => break ListenerExit::Cancelled,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if let ControlFlow::Break(exit) = self.feed(&chunk) {
                        break exit;
                    }
                }
                Some(Err(e)) => {
                    warn!("SSE error: {}", e);
                    break ListenerExit::Failed(e.to_string());
                }
                None => break ListenerExit::Closed,
            }
        };

        if self.framer.pending_len() > 0 {
            debug!("Discarding {} bytes of unfinished stream block", self.framer.pending_len());
        }
        exit
    }
}

/// Connects to the session stream and drains it.
pub async fn listen(
    api: Arc<dyn InterpreterApi>,
    session_id: String,
    store: ResultStore,
    token: CancellationToken,
) -> ListenerExit {
    let stream = tokio::select! {
        biased;
        _ = token.cancelled() => return ListenerExit::Cancelled,
        opened = api.open_stream(&session_id) => opened,
    };

    match stream {
        Ok(stream) => StreamListener::new(store, token).drain(stream).await,
        Err(e) => {
            warn!("SSE error: {}", e);
            ListenerExit::Failed(e.to_string())
        }
    }
}

fn joined(result: Result<ListenerExit, JoinError>) -> ListenerExit {
    match result {
        Ok(exit) => exit,
        Err(e) => {
            warn!("Listener task did not shut down cleanly: {}", e);
            ListenerExit::Failed(e.to_string())
        }
    }
}

/// A spawned listener task. Dropping the handle cancels the task.
pub struct ListenerHandle {
    token: CancellationToken,
    join: Option<JoinHandle<ListenerExit>>,
    exit: Option<ListenerExit>,
}

impl ListenerHandle {
    pub fn spawn(api: Arc<dyn InterpreterApi>, session_id: &str, store: ResultStore) -> Self {
        let token = CancellationToken::new();
        let join = tokio::spawn(listen(api, session_id.to_string(), store, token.clone()));
        Self {
            token,
            join: Some(join),
            exit: None,
        }
    }

    /// Gives the task up to `grace` to finish on its own (e.g. on `ended`).
    /// Returns true if it did.
    pub async fn settle(&mut self, grace: Duration) -> bool {
        let Some(join) = self.join.as_mut() else {
            return true;
        };
        match tokio::time::timeout(grace, join).await {
            Ok(result) => {
                self.exit = Some(joined(result));
                self.join = None;
                true
            }
            Err(_) => false,
        }
    }

    /// Cancels the task and waits for it to stop.
    pub async fn shutdown(mut self) -> ListenerExit {
        self.token.cancel();
        if let Some(join) = self.join.take() {
            return joined(join.await);
        }
        self.exit.take().unwrap_or(ListenerExit::Cancelled)
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
