/// The analysis pipeline driver: samples frames from a pose source, feeds
/// them through the exercise's feature extractor, and turns the aggregated
/// series into the final scored result.
use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::models::analysis::{AnalysisError, AnalysisResult, Exercise};
use crate::models::landmark::PoseFrame;
use crate::services::exercises::ExerciseAccumulator;
use crate::services::frame_source::{PoseFrameSource, VideoPoseSource};
use crate::services::pose_estimation_service::PoseEstimator;

/// Orchestrates one video analysis end to end.
pub struct FormAnalysisService {
    config: AnalysisConfig,
}

impl FormAnalysisService {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyze a video file on disk.
    ///
    /// Loads a fresh pose-estimation session for this call; the session and
    /// the extracted-frame directory are owned by the frame source and
    /// dropped on every exit path.
    pub fn analyze_video(
        &self,
        video_path: &Path,
        exercise: Exercise,
    ) -> Result<AnalysisResult, AnalysisError> {
        let estimator = PoseEstimator::new(&self.config.model_path)
            .map_err(AnalysisError::Internal)?;

        let source = VideoPoseSource::open(video_path, estimator, self.config.frame_stride)
            .map_err(|err| {
                warn!(error = %err, video = %video_path.display(), "could not open video");
                AnalysisError::DecodeFailure
            })?;

        self.analyze(source, exercise)
    }

    /// Run the pipeline over an already-opened frame source.
    pub fn analyze<S: PoseFrameSource>(
        &self,
        mut source: S,
        exercise: Exercise,
    ) -> Result<AnalysisResult, AnalysisError> {
        let analysis_id = Uuid::new_v4();
        info!(%analysis_id, %exercise, "starting form analysis");

        let mut accumulator = ExerciseAccumulator::new(exercise);
        let mut processed = 0usize;

        while processed < self.config.max_frames {
            let Some(sampled) = source.next_frame().map_err(AnalysisError::Internal)? else {
                break;
            };
            processed += 1;

            // Frames without a detection advance the counter but contribute
            // no data.
            let Some(landmarks) = sampled.landmarks else {
                continue;
            };

            let frame = PoseFrame::new(sampled.frame_index, landmarks);
            accumulator.observe(&frame, sampled.width, sampled.height);
        }

        if accumulator.primary_samples() < self.config.min_frames {
            warn!(
                %analysis_id,
                processed,
                usable = accumulator.primary_samples(),
                "insufficient pose evidence"
            );
            return Err(AnalysisError::InsufficientEvidence(
                accumulator.insufficient_evidence_message().to_string(),
            ));
        }

        let result = accumulator.finish();
        info!(
            %analysis_id,
            processed,
            overall_score = result.overall_score,
            corrections = result.corrections_needed.len(),
            "form analysis complete"
        );
        Ok(result)
    }
}
