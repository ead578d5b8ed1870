//! Transcoder capability and its FFmpeg implementation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use amux_models::Preset;

use crate::command::{check_ffmpeg, check_ffprobe, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::presets::{preset_command, PresetOptions};
use crate::probe::probe_duration;

/// Input to a transcode call.
#[derive(Debug, Clone, Copy)]
pub struct TranscodeRequest<'a> {
    /// Local input files, already in concatenation order
    pub inputs: &'a [PathBuf],
    /// Output preset
    pub preset: Preset,
    /// Directory owned by the caller for the output file
    pub work_dir: &'a Path,
}

/// Output of a successful transcode.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeOutput {
    /// Output file inside the request's `work_dir`
    pub path: PathBuf,
    /// Duration of the output in seconds
    pub duration_seconds: f64,
}

/// Turns an ordered list of audio files into one media file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, request: TranscodeRequest<'_>) -> MediaResult<TranscodeOutput>;

    /// Check the transcoder can run (binaries present, etc.).
    fn check_available(&self) -> MediaResult<()>;

    fn name(&self) -> &'static str;
}

/// Transcoder configuration.
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// FFmpeg binary (name on PATH or absolute path)
    pub ffmpeg_path: PathBuf,
    /// FFprobe binary
    pub ffprobe_path: PathBuf,
    /// Hard limit for a single FFmpeg run
    pub ffmpeg_timeout_secs: u64,
    /// Encoding options
    pub preset_options: PresetOptions,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            ffmpeg_timeout_secs: 1800,
            preset_options: PresetOptions::default(),
        }
    }
}

impl TranscoderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = PresetOptions::default();
        Self {
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ffmpeg")),
            ffprobe_path: std::env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ffprobe")),
            ffmpeg_timeout_secs: std::env::var("AMUX_FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),
            preset_options: PresetOptions {
                background_color: std::env::var("AMUX_BACKGROUND_COLOR")
                    .unwrap_or(defaults.background_color),
                width: std::env::var("AMUX_FRAME_WIDTH")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.width),
                height: std::env::var("AMUX_FRAME_HEIGHT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.height),
                audio_bitrate: std::env::var("AMUX_AUDIO_BITRATE")
                    .unwrap_or(defaults.audio_bitrate),
                ..defaults
            },
        }
    }
}

/// Transcoder that shells out to FFmpeg and FFprobe.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, request: TranscodeRequest<'_>) -> MediaResult<TranscodeOutput> {
        for input in request.inputs {
            if !input.exists() {
                return Err(MediaError::FileNotFound(input.clone()));
            }
        }

        let output = request
            .work_dir
            .join(format!("output.{}", request.preset.extension()));
        let cmd = preset_command(
            request.preset,
            request.inputs,
            &output,
            &self.config.preset_options,
        )?;

        info!(
            preset = %request.preset,
            inputs = request.inputs.len(),
            "Starting FFmpeg transcode"
        );
        let started = Instant::now();

        FfmpegRunner::new()
            .with_program(&self.config.ffmpeg_path)
            .with_timeout(self.config.ffmpeg_timeout_secs)
            .run_with_progress(&cmd, |progress| {
                debug!(
                    out_time_secs = progress.out_time_seconds(),
                    speed = progress.speed,
                    "FFmpeg progress"
                );
            })
            .await?;

        let info = probe_duration(&self.config.ffprobe_path, &output).await?;
        if request.preset.has_video() && !info.has_video {
            return Err(MediaError::invalid_media("output has no video stream"));
        }

        info!(
            preset = %request.preset,
            duration_secs = info.duration,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "FFmpeg transcode finished"
        );

        Ok(TranscodeOutput {
            path: output,
            duration_seconds: info.duration,
        })
    }

    fn check_available(&self) -> MediaResult<()> {
        check_ffmpeg(&self.config.ffmpeg_path)?;
        check_ffprobe(&self.config.ffprobe_path)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_input_is_reported_before_spawning() {
        let dir = tempfile::TempDir::new().unwrap();
        let transcoder = FfmpegTranscoder::new(TranscoderConfig::default());
        let inputs = vec![dir.path().join("missing.bin")];

        let err = transcoder
            .transcode(TranscodeRequest {
                inputs: &inputs,
                preset: Preset::AudioOnly,
                work_dir: dir.path(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn test_unavailable_binaries() {
        let transcoder = FfmpegTranscoder::new(TranscoderConfig {
            ffmpeg_path: PathBuf::from("no-such-ffmpeg-amux"),
            ..Default::default()
        });
        assert!(matches!(
            transcoder.check_available(),
            Err(MediaError::FfmpegNotFound(_))
        ));
    }
}
