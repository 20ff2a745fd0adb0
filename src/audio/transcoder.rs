use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ProbeError, ProbeResult};

/// Black-box audio tool: reports a recording's length and cuts clips from it.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Total duration of `input` in seconds.
    async fn probe_duration(&self, input: &Path) -> ProbeResult<f64>;

    /// Writes `[start, start + length)` of `input` to `output` as an
    /// independent encoded clip.
    async fn extract(&self, input: &Path, start: f64, length: f64, output: &Path) -> ProbeResult<()>;
}

/// Encoding of every clip produced by [`FfmpegTranscoder`].
pub const CLIP_FORMAT: &str = "aac";
const CLIP_SAMPLE_RATE: &str = "16000";
const CLIP_CHANNELS: &str = "1";
const CLIP_BITRATE: &str = "64k";

/// Shells out to `ffprobe` / `ffmpeg` on PATH.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder;

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

async fn run_command(program: &str, args: &[String]) -> ProbeResult<std::process::Output> {
    debug!("Running {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProbeError::CommandMissing(program.to_string()),
            _ => ProbeError::Io(e),
        })?;

    if !output.status.success() {
        return Err(ProbeError::from_command_failure(
            program,
            output.status.code(),
            &output.stderr,
        ));
    }
    Ok(output)
}

/// Pulls `format.duration` out of ffprobe's JSON report.
pub fn parse_probe_duration(json: &str) -> Option<f64> {
    let parsed: ProbeOutput = serde_json::from_str(json).ok()?;
    let secs = parsed.format.duration?.trim().parse::<f64>().ok()?;
    (secs.is_finite() && secs >= 0.0).then_some(secs)
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn probe_duration(&self, input: &Path) -> ProbeResult<f64> {
        let args = vec![
            "-v".to_owned(),
            "quiet".to_owned(),
            "-print_format".to_owned(),
            "json".to_owned(),
            "-show_format".to_owned(),
            input.display().to_string(),
        ];
        let output = run_command("ffprobe", &args).await?;
        parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| ProbeError::DurationUnavailable(input.to_path_buf()))
    }

    async fn extract(&self, input: &Path, start: f64, length: f64, output: &Path) -> ProbeResult<()> {
        let args = vec![
            "-y".to_owned(),
            "-v".to_owned(),
            "quiet".to_owned(),
            "-ss".to_owned(),
            start.to_string(),
            "-t".to_owned(),
            length.to_string(),
            "-i".to_owned(),
            input.display().to_string(),
            "-acodec".to_owned(),
            CLIP_FORMAT.to_owned(),
            "-ar".to_owned(),
            CLIP_SAMPLE_RATE.to_owned(),
            "-ac".to_owned(),
            CLIP_CHANNELS.to_owned(),
            "-b:a".to_owned(),
            CLIP_BITRATE.to_owned(),
            output.display().to_string(),
        ];
        run_command("ffmpeg", &args).await?;
        Ok(())
    }
}
