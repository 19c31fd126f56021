use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Tunables of the analysis pipeline.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Process every Nth decoded frame.
    pub frame_stride: usize,
    /// Stop after this many processed frames.
    pub max_frames: usize,
    /// Minimum frames that must yield the primary metric.
    pub min_frames: usize,
    /// Path to the ONNX pose landmark model.
    pub model_path: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_stride: 3,
            max_frames: 600,
            min_frames: 3,
            model_path: PathBuf::from("models/pose_landmarker.onnx"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Upload size cap in bytes.
    pub max_upload_bytes: usize,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .unwrap_or(5000);
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let max_upload_bytes = env::var("MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100)
            * 1024
            * 1024;

        let defaults = AnalysisConfig::default();
        let analysis = AnalysisConfig {
            frame_stride: env_usize("FRAME_STRIDE", defaults.frame_stride),
            max_frames: env_usize("MAX_FRAMES", defaults.max_frames),
            min_frames: env_usize("MIN_POSE_FRAMES", defaults.min_frames),
            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
        };

        Ok(AppConfig {
            host,
            port,
            log_level,
            max_upload_bytes,
            analysis,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.frame_stride, 3);
        assert_eq!(config.max_frames, 600);
        assert_eq!(config.min_frames, 3);
    }

    #[test]
    fn test_server_address() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            max_upload_bytes: 100 * 1024 * 1024,
            analysis: AnalysisConfig::default(),
        };
        assert_eq!(config.server_address(), "127.0.0.1:5000");
    }
}
