//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Whether a video stream is present
    pub has_video: bool,
    /// Whether an audio stream is present
    pub has_audio: bool,
    /// File size in bytes
    pub size: u64,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    duration: Option<String>,
}

/// Probe a media file with the given `ffprobe` binary.
pub async fn probe_duration(ffprobe: impl AsRef<Path>, path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();
    let ffprobe = ffprobe.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let program = which::which(ffprobe)
        .map_err(|_| MediaError::FfprobeNotFound(ffprobe.display().to_string()))?;

    let output = Command::new(program)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Parse FFprobe JSON into [`MediaInfo`].
///
/// Falls back to the longest stream duration when the container does not
/// report one.
fn parse_probe_output(json: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let stream_duration = probe
        .streams
        .iter()
        .filter_map(|s| s.duration.as_ref().and_then(|d| d.parse::<f64>().ok()))
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .or(stream_duration)
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| MediaError::invalid_media("no positive duration reported"))?;

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    Ok(MediaInfo {
        duration,
        has_video: probe.streams.iter().any(|s| s.codec_type == "video"),
        has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_duration() {
        let json = br#"{
            "format": {"duration": "12.480000", "size": "204800"},
            "streams": [{"codec_type": "video"}, {"codec_type": "audio", "duration": "12.40"}]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration - 12.48).abs() < 1e-6);
        assert!(info.has_video);
        assert!(info.has_audio);
        assert_eq!(info.size, 204800);
    }

    #[test]
    fn test_parse_falls_back_to_stream_duration() {
        let json = br#"{
            "format": {},
            "streams": [{"codec_type": "audio", "duration": "3.5"}, {"codec_type": "audio", "duration": "4.0"}]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration - 4.0).abs() < 1e-6);
        assert!(!info.has_video);
    }

    #[test]
    fn test_parse_rejects_zero_duration() {
        let json = br#"{"format": {"duration": "0.000000"}, "streams": []}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(MediaError::InvalidMedia(_))
        ));
    }
}
