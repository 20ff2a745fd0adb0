use std::path::PathBuf;

use thiserror::Error;

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Failures talking to the interpreter backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{operation} failed: {status} {body}")]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("could not decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read segment audio `{path}`: {source}")]
    SegmentAudio {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("audio file not found: {0}")]
    AudioNotFound(PathBuf),

    #[error("no API key found; set XJP_API_KEY or use --api-key")]
    MissingApiKey,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not determine duration of `{0}`")]
    DurationUnavailable(PathBuf),

    #[error("missing command `{0}` on PATH")]
    CommandMissing(String),

    #[error("command failed: `{command}` (status: {status}){stderr_suffix}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr_suffix: String,
    },

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ProbeError {
    pub fn from_command_failure(command: &str, status: Option<i32>, stderr: &[u8]) -> Self {
        let stderr = String::from_utf8_lossy(stderr);
        let trimmed = stderr.trim();
        let stderr_suffix = if trimmed.is_empty() {
            String::new()
        } else {
            format!(": {trimmed}")
        };
        ProbeError::CommandFailed {
            command: command.to_owned(),
            status: status.unwrap_or(-1),
            stderr_suffix,
        }
    }

    /// Configuration problems are detected before any network activity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProbeError::AudioNotFound(_) | ProbeError::MissingApiKey | ProbeError::InvalidConfig(_)
        )
    }
}
