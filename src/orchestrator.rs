use std::sync::Arc;

use tracing::{info, warn};

use crate::audio::{SegmentDescriptor, Segmenter, Transcoder};
use crate::config::RunConfig;
use crate::error::ProbeResult;
use crate::report;
use crate::results::{ResultRecord, ResultSource, ResultStore};
use crate::services::interpreter::{InterpreterApi, ProcessOutcome, SessionInfo, SessionSummary};
use crate::stream::{ListenerExit, ListenerHandle};
use crate::telemetry::{TelemetryEvent, TelemetryRecorder, TelemetrySnapshot};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub session: SessionInfo,
    pub segments: Vec<SegmentDescriptor>,
    pub records: Vec<ResultRecord>,
    pub summary: Option<SessionSummary>,
    pub telemetry: TelemetrySnapshot,
    /// `None` when streaming was disabled.
    pub stream_exit: Option<ListenerExit>,
}

impl RunReport {
    pub fn render(&self) -> String {
        format!(
            "{}\n\n\n{}",
            report::render_summary(self.summary.as_ref(), self.segments.len(), &self.telemetry),
            report::render_transcripts(&self.records)
        )
    }
}

const BANNER_WIDTH: usize = 60;

/// Drives one end-to-end run against the backend.
pub struct RunOrchestrator<T> {
    config: RunConfig,
    api: Arc<dyn InterpreterApi>,
    segmenter: Segmenter<T>,
}

impl<T: Transcoder> RunOrchestrator<T> {
    pub fn new(config: RunConfig, api: Arc<dyn InterpreterApi>, transcoder: T) -> Self {
        let segmenter = Segmenter::new(transcoder, config.segmenter);
        Self { config, api, segmenter }
    }

    fn log_banner(&self) {
        let rule = "=".repeat(BANNER_WIDTH);
        info!("{}", rule);
        info!("Interpreter Session Test");
        info!("{}", rule);
        info!("Audio file: {}", self.config.audio_path.display());
        info!("Base URL: {}", self.config.base_url);
        info!("Target language: {}", self.config.target_language);
        info!("Use SSE: {}", self.config.use_stream);
        info!("{}", rule);
    }

    pub async fn run(&self) -> ProbeResult<RunReport> {
        self.log_banner();
        self.config.validate()?;

        // Clips live only as long as this directory.
        let workdir = tempfile::Builder::new().prefix("interpreter-probe-").tempdir()?;

        info!("Slicing audio...");
        let segments = self.segmenter.slice(&self.config.audio_path, workdir.path()).await?;
        info!("Created {} segments", segments.len());

        info!("Creating interpreter session...");
        let session = self
            .api
            .create_session(&self.config.target_language, self.config.segmenter.overlap)
            .await?;
        info!("Session created: {}", session.session_id);
        info!("Stream URL: {}", session.stream_url.as_deref().unwrap_or("(none)"));

        let store = ResultStore::new();
        let mut telemetry = TelemetryRecorder::new();

        let mut listener = if self.config.use_stream {
            info!("Starting SSE listener...");
            let handle = ListenerHandle::spawn(self.api.clone(), &session.session_id, store.clone());
            tokio::time::sleep(self.config.connect_grace).await;
            Some(handle)
        } else {
            None
        };

        let submitted = self
            .submit_all(&session.session_id, &segments, &store, &mut telemetry)
            .await;

        let stream_exit = match listener.take() {
            Some(mut handle) => {
                if submitted.is_ok() {
                    info!("Waiting for SSE results...");
                    if handle.settle(self.config.trailing_grace).await {
                        info!("SSE stream finished before the grace period ran out");
                    }
                }
                let exit = handle.shutdown().await;
                telemetry.record(TelemetryEvent::StreamExited((&exit).into()));
                Some(exit)
            }
            None => None,
        };

        if let Err(e) = submitted {
            self.abandon_session(&session.session_id).await;
            return Err(e);
        }

        info!("Ending session...");
        let ended = self.api.end_session(&session.session_id).await?;

        let records = store.snapshot();
        telemetry.record_stream_results(&records);

        Ok(RunReport {
            session,
            segments,
            records,
            summary: ended.summary,
            telemetry: telemetry.snapshot(),
            stream_exit,
        })
    }

    /// Submits every segment in order, pacing between submissions.
    async fn submit_all(
        &self,
        session_id: &str,
        segments: &[SegmentDescriptor],
        store: &ResultStore,
        telemetry: &mut TelemetryRecorder,
    ) -> ProbeResult<()> {
        info!("Processing segments...");
        let last = segments.len().saturating_sub(1);

        for (i, seg) in segments.iter().enumerate() {
            info!(
                "Sending segment {}/{} ({:.1}s - {:.1}s)...",
                i, last, seg.start_time, seg.end_time
            );

            let response = self.api.process_segment(session_id, seg).await?;
            let latency_ms = response.latency_ms();
            telemetry.record(TelemetryEvent::SegmentSubmitted {
                index: seg.index,
                outcome: (&response.outcome).into(),
                latency_ms,
            });

            match &response.outcome {
                ProcessOutcome::Accepted { tracking_id } => match tracking_id {
                    Some(id) => info!("  accepted ({:.0}ms, task {})", latency_ms, id),
                    None => info!("  accepted ({:.0}ms)", latency_ms),
                },
                ProcessOutcome::Completed(result) => {
                    let record = result.to_record(seg.index, ResultSource::Sync, latency_ms);
                    let head: String = record.original_text.chars().take(50).collect();
                    info!("  done ({:.0}ms): {}...", latency_ms, head);
                    store.upsert(record);
                }
                ProcessOutcome::Failed { status, message } => {
                    warn!("  error: {}: {}", status, message);
                }
            }

            if !self.config.submit_delay.is_zero() && i < last {
                tokio::time::sleep(self.config.submit_delay).await;
            }
        }
        Ok(())
    }

    /// Best-effort cleanup after a failed run.
    async fn abandon_session(&self, session_id: &str) {
        if let Err(e) = self.api.end_session(session_id).await {
            warn!("Could not end session {} after failure: {}", session_id, e);
        }
    }
}
