pub mod segment;
pub mod transcoder;

pub use segment::{plan_windows, SegmentDescriptor, SegmentWindow, Segmenter};
pub use transcoder::{FfmpegTranscoder, Transcoder};
