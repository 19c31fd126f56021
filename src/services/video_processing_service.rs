/// Video decoding via the FFmpeg CLI tools.
///
/// Runs synchronously; callers are expected to be on a blocking thread
/// (the analysis pipeline runs under `spawn_blocking`).
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use tracing::info;

/// Service wrapping `ffprobe`/`ffmpeg` invocations.
pub struct VideoProcessingService {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl VideoProcessingService {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }

    /// Create service with custom FFmpeg paths.
    pub fn with_paths(ffmpeg_path: String, ffprobe_path: String) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
        }
    }

    /// Extract stream metadata (dimensions, duration, container format).
    pub fn probe(&self, video_path: &Path) -> Result<VideoInfo> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,duration",
                "-show_entries",
                "format=duration,format_name",
                "-of",
                "json",
            ])
            .arg(video_path)
            .output()
            .context("failed to execute ffprobe")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("ffprobe failed: {stderr}"));
        }

        let json_output = String::from_utf8(output.stdout)?;
        let metadata: FfprobeOutput =
            serde_json::from_str(&json_output).context("failed to parse ffprobe output")?;

        let stream = metadata
            .streams
            .first()
            .context("no video stream found")?;

        Ok(VideoInfo {
            width: stream.width,
            height: stream.height,
            duration_seconds: stream
                .duration
                .clone()
                .or(metadata.format.duration.clone())
                .and_then(|d| d.parse::<f64>().ok())
                .unwrap_or(0.0),
            format_name: metadata.format.format_name,
        })
    }

    /// Extract every frame of the video into `output_dir` as JPEGs, in
    /// decode order. The analysis layer applies its own sampling stride.
    pub fn extract_frames(&self, video_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let frame_pattern = output_dir.join("frame_%06d.jpg");

        let status = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(video_path)
            .args(["-q:v", "2", "-y"])
            .arg(&frame_pattern)
            .status()
            .context("failed to execute ffmpeg for frame extraction")?;

        if !status.success() {
            return Err(anyhow!("ffmpeg frame extraction failed"));
        }

        let mut frames = Vec::new();
        for entry in std::fs::read_dir(output_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("jpg") {
                frames.push(path);
            }
        }
        frames.sort();

        info!(frames = frames.len(), "extracted video frames");
        Ok(frames)
    }
}

impl Default for VideoProcessingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Video metadata.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
    pub format_name: String,
}

impl VideoInfo {
    pub fn resolution_string(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

// FFprobe JSON output structures
#[derive(Debug, serde::Deserialize)]
struct FfprobeOutput {
    streams: Vec<FfprobeStream>,
    format: FfprobeFormat,
}

#[derive(Debug, serde::Deserialize)]
struct FfprobeStream {
    width: u32,
    height: u32,
    duration: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    format_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_string() {
        let info = VideoInfo {
            width: 1920,
            height: 1080,
            duration_seconds: 12.5,
            format_name: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
        };
        assert_eq!(info.resolution_string(), "1920x1080");
    }

    #[test]
    fn test_ffprobe_output_parsing() {
        let json = r#"{
            "streams": [{"width": 1280, "height": 720, "duration": "4.2"}],
            "format": {"duration": "4.2", "format_name": "matroska,webm"}
        }"#;
        let parsed: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.streams[0].width, 1280);
        assert_eq!(parsed.format.format_name, "matroska,webm");
    }
}
