/// Pose frame sources: the contract between the analysis pipeline and the
/// video/pose-estimation layer.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tempfile::TempDir;
use tracing::info;

use crate::models::landmark::LandmarkMap;
use crate::services::pose_estimation_service::PoseEstimator;
use crate::services::video_processing_service::VideoProcessingService;

/// One sampled frame from a source: the raw index in the decoded stream,
/// the detected landmarks (absent when detection failed on that frame),
/// and the frame dimensions the core scales coordinates by.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub frame_index: usize,
    pub landmarks: Option<LandmarkMap>,
    pub width: f64,
    pub height: f64,
}

/// A lazy, finite, non-restartable sequence of sampled pose frames.
pub trait PoseFrameSource {
    /// Next sampled frame, or `None` once the sequence is exhausted.
    fn next_frame(&mut self) -> Result<Option<SampledFrame>>;
}

impl<T: PoseFrameSource + ?Sized> PoseFrameSource for &mut T {
    fn next_frame(&mut self) -> Result<Option<SampledFrame>> {
        (**self).next_frame()
    }
}

/// Whether a 0-based decoded-frame index lands on the sampling stride.
/// Frames are numbered from 1 for the stride check, so stride 3 keeps
/// frames 3, 6, 9, ...
fn on_stride(index: usize, stride: usize) -> bool {
    stride <= 1 || (index + 1) % stride == 0
}

/// Frame source backed by a video file: frames are extracted up front via
/// ffmpeg, then lazily decoded and run through the pose estimator at the
/// configured stride.
///
/// Owns the per-analysis pose-estimation session and the extracted-frame
/// directory; both are released on drop, whichever way the analysis exits.
pub struct VideoPoseSource {
    estimator: PoseEstimator,
    frame_files: Vec<PathBuf>,
    cursor: usize,
    stride: usize,
    width: f64,
    height: f64,
    _workdir: TempDir,
}

impl VideoPoseSource {
    pub fn open(video_path: &Path, estimator: PoseEstimator, stride: usize) -> Result<Self> {
        let processor = VideoProcessingService::new();
        let metadata = processor
            .probe(video_path)
            .context("failed to probe video")?;

        let workdir = TempDir::new().context("failed to create frame workdir")?;
        let frame_files = processor
            .extract_frames(video_path, workdir.path())
            .context("failed to extract frames")?;
        if frame_files.is_empty() {
            bail!("video contained no decodable frames");
        }

        info!(
            frames = frame_files.len(),
            width = metadata.width,
            height = metadata.height,
            stride,
            "opened video for pose sampling"
        );

        Ok(Self {
            estimator,
            frame_files,
            cursor: 0,
            stride: stride.max(1),
            width: metadata.width as f64,
            height: metadata.height as f64,
            _workdir: workdir,
        })
    }
}

impl PoseFrameSource for VideoPoseSource {
    fn next_frame(&mut self) -> Result<Option<SampledFrame>> {
        while self.cursor < self.frame_files.len() {
            let frame_index = self.cursor;
            self.cursor += 1;
            if !on_stride(frame_index, self.stride) {
                continue;
            }

            let image = image::open(&self.frame_files[frame_index])
                .with_context(|| format!("failed to decode frame {frame_index}"))?;
            let landmarks = self.estimator.detect(&image)?;

            return Ok(Some(SampledFrame {
                frame_index,
                landmarks,
                width: self.width,
                height: self.height,
            }));
        }

        Ok(None)
    }
}
