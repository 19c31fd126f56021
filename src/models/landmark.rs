/// Landmark vocabulary and per-frame pose data.
///
/// A frame owns its landmarks; nothing downstream mutates them. Coordinates
/// arrive normalized to [0, 1] from the pose source and are scaled to pixel
/// space by the feature extractors.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::services::geometry::Point;

/// Fixed vocabulary of body points the analysis pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkName {
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftToe,
    RightToe,
}

impl LandmarkName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftToe => "left_toe",
            Self::RightToe => "right_toe",
        }
    }

    pub fn all() -> [LandmarkName; 16] {
        [
            Self::LeftEar,
            Self::RightEar,
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftElbow,
            Self::RightElbow,
            Self::LeftWrist,
            Self::RightWrist,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
            Self::LeftToe,
            Self::RightToe,
        ]
    }
}

/// A detected body point in normalized [0, 1] image coordinates with a
/// detection-visibility confidence in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    /// Pixel-space position for the given frame dimensions.
    pub fn point(&self, width: f64, height: f64) -> Point {
        Point::new(self.x * width, self.y * height)
    }
}

pub type LandmarkMap = HashMap<LandmarkName, Landmark>;

/// Which side of the body a limb group reads from. Re-chosen every frame;
/// the tracked side may legitimately change if the subject turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn ear(self) -> LandmarkName {
        match self {
            Side::Left => LandmarkName::LeftEar,
            Side::Right => LandmarkName::RightEar,
        }
    }

    pub fn shoulder(self) -> LandmarkName {
        match self {
            Side::Left => LandmarkName::LeftShoulder,
            Side::Right => LandmarkName::RightShoulder,
        }
    }

    pub fn elbow(self) -> LandmarkName {
        match self {
            Side::Left => LandmarkName::LeftElbow,
            Side::Right => LandmarkName::RightElbow,
        }
    }

    pub fn wrist(self) -> LandmarkName {
        match self {
            Side::Left => LandmarkName::LeftWrist,
            Side::Right => LandmarkName::RightWrist,
        }
    }

    pub fn hip(self) -> LandmarkName {
        match self {
            Side::Left => LandmarkName::LeftHip,
            Side::Right => LandmarkName::RightHip,
        }
    }

    pub fn knee(self) -> LandmarkName {
        match self {
            Side::Left => LandmarkName::LeftKnee,
            Side::Right => LandmarkName::RightKnee,
        }
    }

    pub fn ankle(self) -> LandmarkName {
        match self {
            Side::Left => LandmarkName::LeftAnkle,
            Side::Right => LandmarkName::RightAnkle,
        }
    }

    pub fn toe(self) -> LandmarkName {
        match self {
            Side::Left => LandmarkName::LeftToe,
            Side::Right => LandmarkName::RightToe,
        }
    }
}

/// One sampled frame's landmarks. Immutable after construction.
#[derive(Debug, Clone)]
pub struct PoseFrame {
    /// Index in the sampled sequence.
    pub index: usize,
    landmarks: LandmarkMap,
    /// Mean visibility across all landmarks in the frame.
    pub visibility: f64,
}

impl PoseFrame {
    pub fn new(index: usize, landmarks: LandmarkMap) -> Self {
        let visibility = if landmarks.is_empty() {
            0.0
        } else {
            landmarks.values().map(|lm| lm.visibility).sum::<f64>() / landmarks.len() as f64
        };

        Self {
            index,
            landmarks,
            visibility,
        }
    }

    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.landmarks.get(&name)
    }

    fn summed_visibility(&self, names: &[LandmarkName]) -> f64 {
        names
            .iter()
            .filter_map(|name| self.get(*name))
            .map(|lm| lm.visibility)
            .sum()
    }

    /// Side to trust for leg metrics, by summed hip + knee visibility.
    /// Ties default to the left side.
    pub fn leg_side(&self) -> Side {
        let left = self.summed_visibility(&[LandmarkName::LeftHip, LandmarkName::LeftKnee]);
        let right = self.summed_visibility(&[LandmarkName::RightHip, LandmarkName::RightKnee]);
        if left >= right {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Side to trust for arm metrics, by summed shoulder + elbow + wrist
    /// visibility. Ties default to the left side.
    pub fn arm_side(&self) -> Side {
        let left = self.summed_visibility(&[
            LandmarkName::LeftShoulder,
            LandmarkName::LeftElbow,
            LandmarkName::LeftWrist,
        ]);
        let right = self.summed_visibility(&[
            LandmarkName::RightShoulder,
            LandmarkName::RightElbow,
            LandmarkName::RightWrist,
        ]);
        if left >= right {
            Side::Left
        } else {
            Side::Right
        }
    }
}
