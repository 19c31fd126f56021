/// Pose estimation using ONNX Runtime.
///
/// Wraps a single-person full-body landmark model (BlazePose-style ONNX
/// export). Model contract:
/// - Input `input_1`: [1, 3, 256, 256] FP32, NCHW, RGB, normalized [0, 1]
/// - Output `Identity`: [1, 195] FP32 — 33 landmarks x (x, y, z,
///   visibility, presence), coordinates in input-pixel space, visibility
///   and presence as logits
/// - Output `Identity_1`: [1, 1] FP32 — pose presence score
///
/// Only the 16 landmarks the analysis pipeline consumes are extracted; the
/// index map follows the model's 33-point layout.
use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use ndarray::{s, Array4};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

use crate::models::landmark::{Landmark, LandmarkMap, LandmarkName};

/// Model landmark index -> pipeline vocabulary.
const LANDMARK_INDEX_MAP: [(usize, LandmarkName); 16] = [
    (7, LandmarkName::LeftEar),
    (8, LandmarkName::RightEar),
    (11, LandmarkName::LeftShoulder),
    (12, LandmarkName::RightShoulder),
    (13, LandmarkName::LeftElbow),
    (14, LandmarkName::RightElbow),
    (15, LandmarkName::LeftWrist),
    (16, LandmarkName::RightWrist),
    (23, LandmarkName::LeftHip),
    (24, LandmarkName::RightHip),
    (25, LandmarkName::LeftKnee),
    (26, LandmarkName::RightKnee),
    (27, LandmarkName::LeftAnkle),
    (28, LandmarkName::RightAnkle),
    (31, LandmarkName::LeftToe),
    (32, LandmarkName::RightToe),
];

const VALUES_PER_LANDMARK: usize = 5;

/// Per-analysis pose estimation resource. Construct one per analysis run;
/// the underlying session is not shared across concurrent analyses.
pub struct PoseEstimator {
    session: Session,
    model_input_size: u32,
    min_pose_confidence: f32,
}

impl PoseEstimator {
    /// Load the ONNX landmark model from disk.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        ort::init()
            .with_name("form-coach-pose")
            .commit()
            .context("failed to initialize ONNX Runtime")?;

        let session = Session::builder()
            .context("failed to create session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(model_path.as_ref())
            .context("failed to load ONNX model")?;

        tracing::info!(
            "loaded pose landmark model from {}",
            model_path.as_ref().display()
        );

        Ok(Self {
            session,
            model_input_size: 256,
            min_pose_confidence: 0.5,
        })
    }

    /// Set the pose presence threshold below which a frame counts as no
    /// detection.
    ///
    /// Default: 0.5
    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_pose_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    /// Detect the subject's pose in one frame.
    ///
    /// Returns `Ok(None)` when the model reports no confident pose; the
    /// frame is then skipped by the pipeline.
    pub fn detect(&mut self, image: &DynamicImage) -> Result<Option<LandmarkMap>> {
        let (orig_width, orig_height) = image.dimensions();
        let (input_tensor, scale, pad_x, pad_y) = self.preprocess_image(image);

        use ort::inputs;
        let outputs = self
            .session
            .run(inputs!["input_1" => Tensor::from_array(input_tensor)?])
            .context("failed to run pose inference")?;

        let pose_flag = outputs["Identity_1"]
            .try_extract_array::<f32>()
            .context("failed to extract pose flag tensor")?;
        let confidence = pose_flag.iter().copied().next().unwrap_or(0.0);
        if confidence < self.min_pose_confidence {
            return Ok(None);
        }

        let landmarks_tensor = outputs["Identity"]
            .try_extract_array::<f32>()
            .context("failed to extract landmark tensor")?;
        let row = landmarks_tensor.slice(s![0, ..]);

        let mut landmarks = LandmarkMap::with_capacity(LANDMARK_INDEX_MAP.len());
        for (model_index, name) in LANDMARK_INDEX_MAP {
            let base = model_index * VALUES_PER_LANDMARK;
            let raw_x = row[base] as f64;
            let raw_y = row[base + 1] as f64;
            let visibility = sigmoid(row[base + 3] as f64);

            // Undo letterboxing, then normalize to [0, 1] of the original
            // frame.
            let x = (raw_x - pad_x as f64) / scale / orig_width as f64;
            let y = (raw_y - pad_y as f64) / scale / orig_height as f64;

            landmarks.insert(name, Landmark::new(x, y, visibility));
        }

        Ok(Some(landmarks))
    }

    /// Letterbox-resize to the model input square, normalize to [0, 1],
    /// and lay out as NCHW.
    ///
    /// Returns (tensor, scale, pad_x, pad_y) for mapping landmark
    /// coordinates back into the original frame.
    fn preprocess_image(&self, image: &DynamicImage) -> (Array4<f32>, f64, u32, u32) {
        let (width, height) = image.dimensions();
        let target_size = self.model_input_size;

        let (scale, pad_x, pad_y) = letterbox_params(width, height, target_size);
        let new_width = (width as f64 * scale) as u32;
        let new_height = (height as f64 * scale) as u32;

        let resized =
            image.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle);

        let mut padded: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(target_size, target_size, Rgb([114, 114, 114]));
        for y in 0..new_height {
            for x in 0..new_width {
                let pixel = resized.get_pixel(x, y);
                padded.put_pixel(x + pad_x, y + pad_y, Rgb([pixel[0], pixel[1], pixel[2]]));
            }
        }

        let mut input_tensor =
            Array4::<f32>::zeros((1, 3, target_size as usize, target_size as usize));
        for y in 0..target_size {
            for x in 0..target_size {
                let pixel = padded.get_pixel(x, y);
                input_tensor[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
                input_tensor[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
                input_tensor[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
            }
        }

        (input_tensor, scale, pad_x, pad_y)
    }
}

/// Letterbox scale and padding for fitting (width, height) into a
/// target-size square with aspect ratio preserved.
fn letterbox_params(width: u32, height: u32, target_size: u32) -> (f64, u32, u32) {
    let scale = (target_size as f64 / width as f64).min(target_size as f64 / height as f64);
    let new_width = (width as f64 * scale) as u32;
    let new_height = (height as f64 * scale) as u32;
    let pad_x = (target_size - new_width) / 2;
    let pad_y = (target_size - new_height) / 2;
    (scale, pad_x, pad_y)
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_index_map_covers_vocabulary_once() {
        let names: HashSet<_> = LANDMARK_INDEX_MAP.iter().map(|(_, name)| name).collect();
        assert_eq!(names.len(), LandmarkName::all().len());

        let indices: HashSet<_> = LANDMARK_INDEX_MAP.iter().map(|(idx, _)| idx).collect();
        assert_eq!(indices.len(), LANDMARK_INDEX_MAP.len());
    }

    #[test]
    fn test_letterbox_landscape() {
        // 1280x720 into 256: limited by width.
        let (scale, pad_x, pad_y) = letterbox_params(1280, 720, 256);
        assert!((scale - 0.2).abs() < 1e-9);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, (256 - 144) / 2);
    }

    #[test]
    fn test_letterbox_portrait() {
        let (scale, pad_x, pad_y) = letterbox_params(720, 1280, 256);
        assert!((scale - 0.2).abs() < 1e-9);
        assert_eq!(pad_x, (256 - 144) / 2);
        assert_eq!(pad_y, 0);
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
