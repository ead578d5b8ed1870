//! Render presets.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::ValidationError;

/// Output preset understood by the transcoder.
///
/// The set is closed: unknown names are rejected, never mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Audio over a generated still frame (MP4)
    StaticImage,
    /// Audio only (M4A)
    AudioOnly,
    /// Audio with an animated waveform (MP4)
    Waveform,
}

impl Preset {
    /// Every supported preset.
    pub const ALL: [Preset; 3] = [Preset::StaticImage, Preset::AudioOnly, Preset::Waveform];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::StaticImage => "static-image",
            Preset::AudioOnly => "audio-only",
            Preset::Waveform => "waveform",
        }
    }

    /// MIME type of the artifact produced with this preset.
    pub fn content_type(&self) -> &'static str {
        match self {
            Preset::StaticImage | Preset::Waveform => "video/mp4",
            Preset::AudioOnly => "audio/mp4",
        }
    }

    /// File extension of the artifact produced with this preset.
    pub fn extension(&self) -> &'static str {
        match self {
            Preset::StaticImage | Preset::Waveform => "mp4",
            Preset::AudioOnly => "m4a",
        }
    }

    /// Whether the artifact carries a video stream.
    pub fn has_video(&self) -> bool {
        !matches!(self, Preset::AudioOnly)
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedPreset(s.to_string()))
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
