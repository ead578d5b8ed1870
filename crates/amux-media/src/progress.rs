//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg's `-progress` key/value stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Total bytes written so far
    pub total_size: u64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Output time in seconds.
    pub fn out_time_seconds(&self) -> f64 {
        self.out_time_ms as f64 / 1000.0
    }
}

/// Outcome of feeding one stderr line to [`ProgressParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    /// A progress block finished; carries the snapshot
    Update(FfmpegProgress),
    /// A key/value line absorbed into the current block
    Field,
    /// Anything else (diagnostics from FFmpeg itself)
    Other,
}

/// Incremental parser for `-progress pipe:2` output.
#[derive(Debug, Default)]
pub struct ProgressParser {
    current: FfmpegProgress,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of FFmpeg stderr.
    pub fn feed(&mut self, line: &str) -> ProgressLine {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else {
            return ProgressLine::Other;
        };

        match key {
            // FFmpeg reports microseconds under both names.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.current.out_time_ms = us / 1000;
                }
            }
            "total_size" => {
                if let Ok(size) = value.parse() {
                    self.current.total_size = size;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.current.speed = speed;
                }
            }
            "progress" => {
                if value == "end" {
                    self.current.is_complete = true;
                }
                return ProgressLine::Update(self.current.clone());
            }
            "frame" | "fps" | "bitrate" | "out_time" | "dup_frames" | "drop_frames" => {}
            _ if key.starts_with("stream_") => {}
            _ => return ProgressLine::Other,
        }

        ProgressLine::Field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_block() {
        let mut parser = ProgressParser::new();

        assert_eq!(parser.feed("out_time_us=5000000"), ProgressLine::Field);
        assert_eq!(parser.feed("speed=1.5x"), ProgressLine::Field);
        assert_eq!(parser.feed("total_size=2048"), ProgressLine::Field);

        match parser.feed("progress=continue") {
            ProgressLine::Update(p) => {
                assert_eq!(p.out_time_ms, 5000);
                assert!((p.speed - 1.5).abs() < 0.01);
                assert_eq!(p.total_size, 2048);
                assert!(!p.is_complete);
            }
            other => panic!("unexpected {:?}", other),
        }

        match parser.feed("progress=end") {
            ProgressLine::Update(p) => assert!(p.is_complete),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_diagnostic_lines_pass_through() {
        let mut parser = ProgressParser::new();
        assert_eq!(
            parser.feed("chunk_0001.bin: Invalid data found when processing input"),
            ProgressLine::Other
        );
        assert_eq!(parser.feed("speed=N/A"), ProgressLine::Field);
    }
}
