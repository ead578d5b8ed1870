//! Preset to FFmpeg command mapping.
//!
//! Every preset concatenates the audio inputs in the given order through
//! the `concat` filter. Each input is resampled to a common rate and layout
//! first, so chunks recorded with different parameters still join cleanly.

use std::path::{Path, PathBuf};

use amux_models::Preset;

use crate::command::{FfmpegCommand, FfmpegInput};
use crate::error::{MediaError, MediaResult};

/// Encoding knobs shared by all presets.
#[derive(Debug, Clone)]
pub struct PresetOptions {
    /// Background colour for `static-image`
    pub background_color: String,
    /// Video frame width
    pub width: u32,
    /// Video frame height
    pub height: u32,
    /// Video frame rate for `waveform`
    pub frame_rate: u32,
    /// Waveform line colour
    pub waveform_color: String,
    /// AAC bitrate
    pub audio_bitrate: String,
    /// Output sample rate
    pub sample_rate: u32,
}

impl Default for PresetOptions {
    fn default() -> Self {
        Self {
            background_color: "black".to_string(),
            width: 1280,
            height: 720,
            frame_rate: 25,
            waveform_color: "white".to_string(),
            audio_bitrate: "192k".to_string(),
            sample_rate: 44100,
        }
    }
}

/// Filter graph joining `count` audio inputs into `[aout]`.
fn concat_audio_graph(count: usize, sample_rate: u32, out_label: &str) -> String {
    let mut graph = String::new();
    for i in 0..count {
        graph.push_str(&format!(
            "[{i}:a]aresample={sample_rate},aformat=channel_layouts=stereo[a{i}];"
        ));
    }
    for i in 0..count {
        graph.push_str(&format!("[a{i}]"));
    }
    graph.push_str(&format!("concat=n={count}:v=0:a=1[{out_label}]"));
    graph
}

/// Build the FFmpeg command rendering `inputs` with `preset` into `output`.
pub fn preset_command(
    preset: Preset,
    inputs: &[PathBuf],
    output: impl AsRef<Path>,
    options: &PresetOptions,
) -> MediaResult<FfmpegCommand> {
    if inputs.is_empty() {
        return Err(MediaError::NoInputs);
    }

    let count = inputs.len();
    let cmd = FfmpegCommand::new(output).file_inputs(inputs);

    let cmd = match preset {
        Preset::StaticImage => {
            let color = format!(
                "color=c={}:s={}x{}:r=1",
                options.background_color, options.width, options.height
            );
            cmd.input(FfmpegInput::lavfi(color))
                .filter_complex(concat_audio_graph(count, options.sample_rate, "aout"))
                .map(format!("{count}:v"))
                .map("[aout]")
                .video_codec("libx264")
                .output_args(["-tune", "stillimage", "-pix_fmt", "yuv420p"])
                .audio_codec("aac")
                .audio_bitrate(options.audio_bitrate.clone())
                .output_args(["-shortest", "-movflags", "+faststart"])
        }
        Preset::AudioOnly => cmd
            .filter_complex(concat_audio_graph(count, options.sample_rate, "aout"))
            .map("[aout]")
            .audio_codec("aac")
            .audio_bitrate(options.audio_bitrate.clone())
            .output_args(["-movflags", "+faststart"]),
        Preset::Waveform => {
            let graph = format!(
                "{};[acat]asplit=2[aout][awave];[awave]showwaves=s={}x{}:mode=line:rate={}:colors={},format=yuv420p[vout]",
                concat_audio_graph(count, options.sample_rate, "acat"),
                options.width,
                options.height,
                options.frame_rate,
                options.waveform_color,
            );
            cmd.filter_complex(graph)
                .map("[vout]")
                .map("[aout]")
                .video_codec("libx264")
                .output_args(["-pix_fmt", "yuv420p"])
                .audio_codec("aac")
                .audio_bitrate(options.audio_bitrate.clone())
                .output_args(["-movflags", "+faststart"])
        }
    };

    Ok(cmd)
}
