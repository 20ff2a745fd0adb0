use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    AcceptedBody, CreateSessionRequest, EndSessionResponse, ProcessOutcome, ProcessRequest,
    ProcessResponse, SegmentResult, SessionInfo,
};
use super::{EventByteStream, InterpreterApi};
use crate::audio::transcoder::CLIP_FORMAT;
use crate::audio::SegmentDescriptor;
use crate::error::ApiError;

const SESSIONS_PATH: &str = "/asr/v1/interpreter/sessions";

/// reqwest-backed client. No request timeout is set: the event stream must
/// stay open until cancelled or ended by the server.
#[derive(Clone)]
pub struct HttpSessionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSessionClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn sessions_url(&self) -> String {
        format!("{}{}", self.base_url, SESSIONS_PATH)
    }

    pub fn session_url(&self, session_id: &str) -> String {
        format!("{}/{}", self.sessions_url(), session_id)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

async fn fail_with_body(operation: &'static str, response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::UnexpectedStatus { operation, status, body }
}

async fn decode<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { operation, source })
}

#[async_trait]
impl InterpreterApi for HttpSessionClient {
    async fn create_session(&self, target_language: &str, overlap: f64) -> Result<SessionInfo, ApiError> {
        let body = CreateSessionRequest::new(target_language, overlap);
        let response = self
            .client
            .post(self.sessions_url())
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(fail_with_body("create session", response).await);
        }
        decode("create session", response).await
    }

    async fn process_segment(
        &self,
        session_id: &str,
        segment: &SegmentDescriptor,
    ) -> Result<ProcessResponse, ApiError> {
        let audio = tokio::fs::read(&segment.path)
            .await
            .map_err(|source| ApiError::SegmentAudio { path: segment.path.clone(), source })?;

        let body = ProcessRequest {
            audio_base64: BASE64.encode(audio),
            audio_format: CLIP_FORMAT.to_string(),
            start_time: segment.start_time,
            end_time: segment.end_time,
            is_final: segment.is_final,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/process", self.session_url(session_id)))
            .header(AUTHORIZATION, self.bearer())
            .json(&body)
            .send()
            .await?;
        let latency = started.elapsed();

        let outcome = match response.status() {
            StatusCode::OK => ProcessOutcome::Completed(decode::<SegmentResult>("process", response).await?),
            StatusCode::ACCEPTED => {
                // tracking body is optional
                let bytes = response.bytes().await?;
                let accepted: AcceptedBody = serde_json::from_slice(&bytes).unwrap_or_default();
                ProcessOutcome::Accepted { tracking_id: accepted.task_id }
            }
            status => ProcessOutcome::Failed {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            },
        };

        debug!("Segment {} -> {} in {:?}", segment.index, outcome.label(), latency);
        Ok(ProcessResponse { latency, outcome })
    }

    async fn end_session(&self, session_id: &str) -> Result<EndSessionResponse, ApiError> {
        let response = self
            .client
            .delete(self.session_url(session_id))
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(fail_with_body("end session", response).await);
        }
        decode("end session", response).await
    }

    async fn open_stream(&self, session_id: &str) -> Result<EventByteStream, ApiError> {
        let response = self
            .client
            .get(format!("{}/stream", self.session_url(session_id)))
            .header(AUTHORIZATION, self.bearer())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(fail_with_body("open stream", response).await);
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ApiError::from))
            .boxed())
    }
}
