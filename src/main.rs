use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use interpreter_probe::audio::FfmpegTranscoder;
use interpreter_probe::config::{
    DEFAULT_BASE_URL, DEFAULT_OVERLAP_SECS, DEFAULT_SEGMENT_DURATION_SECS, DEFAULT_TARGET_LANGUAGE,
};
use interpreter_probe::credentials::resolve_api_key;
use interpreter_probe::services::interpreter::HttpSessionClient;
use interpreter_probe::{RunConfig, RunOrchestrator, SegmenterConfig};

/// Replays an audio file against the interpreter session API as if it were live
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to audio file (m4a, mp3, wav)
    audio_file: PathBuf,

    /// API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API key (or set XJP_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Target language (zh, en, ja)
    #[arg(long, default_value = DEFAULT_TARGET_LANGUAGE)]
    target_language: String,

    /// Disable SSE streaming
    #[arg(long)]
    no_sse: bool,

    /// Delay between segments (seconds)
    #[arg(long, default_value_t = 0.5)]
    delay: f64,

    /// Segment length (seconds)
    #[arg(long, default_value_t = DEFAULT_SEGMENT_DURATION_SECS)]
    segment_duration: f64,

    /// Audio repeated from the previous segment (seconds)
    #[arg(long, default_value_t = DEFAULT_OVERLAP_SECS)]
    overlap: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = RunConfig::new(&self.audio_file);
        config.base_url = self.base_url.clone();
        config.target_language = self.target_language.clone();
        config.use_stream = !self.no_sse;
        config.submit_delay = RunConfig::delay_from_secs(self.delay)?;
        config.segmenter = SegmenterConfig {
            segment_duration: self.segment_duration,
            overlap: self.overlap,
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Configuration errors stop here, before any network traffic.
    let config = args.run_config().inspect_err(|e| error!("Error: {}", e))?;
    let api_key = resolve_api_key(args.api_key.as_deref())
        .await
        .inspect_err(|e| error!("Error: {}", e))?;

    let client = HttpSessionClient::new(&config.base_url, &api_key);
    let orchestrator = RunOrchestrator::new(config, Arc::new(client), FfmpegTranscoder);

    let report = orchestrator.run().await.context("interpreter run failed")?;
    println!("{}", report.render());
    info!("Done. {} results collected", report.records.len());
    Ok(())
}
