//! Transcoding for the amux render service.
//!
//! This crate provides:
//! - The [`Transcoder`] capability consumed by the render orchestrator
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Timeout and cancellation support via tokio
//! - Preset to filter-graph mapping and FFprobe duration probing

pub mod command;
pub mod error;
pub mod presets;
pub mod probe;
pub mod progress;
pub mod transcoder;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use presets::{preset_command, PresetOptions};
pub use probe::{probe_duration, MediaInfo};
pub use progress::FfmpegProgress;
pub use transcoder::{
    FfmpegTranscoder, TranscodeOutput, TranscodeRequest, Transcoder, TranscoderConfig,
};
