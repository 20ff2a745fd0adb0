//! Session-oriented interpreter backend.

pub mod client;
pub mod types;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::audio::SegmentDescriptor;
use crate::error::ApiError;

pub use client::HttpSessionClient;
pub use types::{
    EndSessionResponse, ProcessOutcome, ProcessResponse, SegmentResult, SessionInfo, SessionSummary,
};

/// Raw bytes of the session event stream, chunked however the transport likes.
pub type EventByteStream = BoxStream<'static, Result<Vec<u8>, ApiError>>;

/// The four backend exchanges a run needs. One request/response each; no
/// state is kept between calls.
#[async_trait]
pub trait InterpreterApi: Send + Sync {
    async fn create_session(&self, target_language: &str, overlap: f64) -> Result<SessionInfo, ApiError>;

    /// Error statuses are an outcome, not an `Err`; only transport and local
    /// read failures are errors.
    async fn process_segment(
        &self,
        session_id: &str,
        segment: &SegmentDescriptor,
    ) -> Result<ProcessResponse, ApiError>;

    async fn end_session(&self, session_id: &str) -> Result<EndSessionResponse, ApiError>;

    /// Opens the long-lived event stream. No timeout applies.
    async fn open_stream(&self, session_id: &str) -> Result<EventByteStream, ApiError>;
}
