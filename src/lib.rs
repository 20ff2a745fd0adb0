pub mod audio;
pub mod config;
pub mod credentials;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod results;
pub mod services;
pub mod stream;
pub mod telemetry;

// Re-export specific items for convenient access
pub use config::{RunConfig, SegmenterConfig};
pub use error::{ApiError, ProbeError, ProbeResult};
pub use orchestrator::{RunOrchestrator, RunReport};
