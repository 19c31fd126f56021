/// Squat analysis: per-frame feature extraction, aggregation policy,
/// scoring tables, and feedback templates.
///
/// Torso lean is reported as deviation from upright (0 degrees = perfectly
/// vertical), so its table reads lower-is-better like every other angular
/// deviation in the pipeline.
use std::collections::BTreeMap;

use tracing::debug;

use crate::models::analysis::{AnalysisResult, Correction, MetricScore, Severity};
use crate::models::landmark::{PoseFrame, Side};
use crate::services::exercises::summary_sentence;
use crate::services::geometry;
use crate::services::scoring::{weighted_overall, Direction, ThresholdTable};
use crate::services::stats;

static DEPTH: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(95.0, 95), (110.0, 85), (125.0, 70)],
    50,
);

static TORSO: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(5.0, 95), (10.0, 80), (15.0, 65)],
    50,
);

static TRACKING: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(0.15, 95), (0.25, 80), (0.35, 65)],
    50,
);

static ANKLE: ThresholdTable = ThresholdTable::new(
    Direction::HigherIsBetter,
    &[(30.0, 95), (20.0, 80), (15.0, 65)],
    50,
);

const DEPTH_WEIGHT: f64 = 0.35;
const TORSO_WEIGHT: f64 = 0.30;
const TRACKING_WEIGHT: f64 = 0.25;
const ANKLE_WEIGHT: f64 = 0.10;

pub const INSUFFICIENT_EVIDENCE: &str =
    "Not enough pose detections to analyze. Ensure full-body in frame and decent lighting.";

/// Metrics computed from one frame. A field is `None` when any geometry it
/// depends on was degenerate.
#[derive(Debug, Clone, Copy)]
struct FrameMetrics {
    knee_angle: Option<f64>,
    hip_angle: Option<f64>,
    torso_lean: Option<f64>,
    ankle_dorsiflexion: Option<f64>,
    knee_deviation: Option<f64>,
    hip_height_vs_knee: f64,
}

/// Accumulates metric series across sampled frames.
#[derive(Debug, Default)]
pub struct SquatAccumulator {
    knee_angles: Vec<f64>,
    hip_angles: Vec<f64>,
    torso_lean: Vec<f64>,
    ankle_dorsiflexion: Vec<f64>,
    knee_deviation: Vec<f64>,
    hip_height_vs_knee: Vec<f64>,
}

impl SquatAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, frame: &PoseFrame, width: f64, height: f64) {
        let side = frame.leg_side();
        let Some(metrics) = extract(frame, side, width, height) else {
            return;
        };

        // The four angle metrics record together or not at all, so each
        // frame contributes a consistent posture snapshot.
        if let (Some(knee), Some(hip), Some(torso), Some(dorsi)) = (
            metrics.knee_angle,
            metrics.hip_angle,
            metrics.torso_lean,
            metrics.ankle_dorsiflexion,
        ) {
            self.knee_angles.push(knee);
            self.hip_angles.push(hip);
            self.torso_lean.push(torso);
            self.ankle_dorsiflexion.push(dorsi);
        }

        if let Some(deviation) = metrics.knee_deviation {
            self.knee_deviation.push(deviation);
        }
        self.hip_height_vs_knee.push(metrics.hip_height_vs_knee);
    }

    /// Number of frames that yielded the primary flexion metric.
    pub fn primary_samples(&self) -> usize {
        self.knee_angles.len()
    }

    pub fn finish(self) -> AnalysisResult {
        let deepest_knee = stats::percentile(&self.knee_angles, 10.0);
        let torso_lean = stats::median(&self.torso_lean);
        let peak_deviation = stats::percentile(&self.knee_deviation, 90.0);
        let peak_dorsiflexion = stats::percentile(&self.ankle_dorsiflexion, 90.0);

        debug!(
            median_hip_flexion = stats::median(&self.hip_angles),
            median_hip_drop_px = stats::median(&self.hip_height_vs_knee),
            "unscored squat biomechanics"
        );

        let depth_score = DEPTH.score(deepest_knee);
        let torso_score = TORSO.score(torso_lean);
        let tracking_score = TRACKING.score(peak_deviation);
        let ankle_score = ANKLE.score(peak_dorsiflexion);

        let overall_score = weighted_overall(&[
            (depth_score, DEPTH_WEIGHT),
            (torso_score, TORSO_WEIGHT),
            (tracking_score, TRACKING_WEIGHT),
            (ankle_score, ANKLE_WEIGHT),
        ]);

        let mut detailed_breakdown = BTreeMap::new();
        detailed_breakdown.insert(
            "depth".to_string(),
            MetricScore {
                score: depth_score,
                feedback: format!("Deepest knee angle ≈ {deepest_knee:.0}°."),
            },
        );
        detailed_breakdown.insert(
            "torso_alignment".to_string(),
            MetricScore {
                score: torso_score,
                feedback: format!("Median torso lean ≈ {torso_lean:.0}° from vertical."),
            },
        );
        detailed_breakdown.insert(
            "knee_tracking".to_string(),
            MetricScore {
                score: tracking_score,
                feedback: format!("Knee drift (normalized) ≈ {peak_deviation:.2}."),
            },
        );
        detailed_breakdown.insert(
            "ankle_mobility".to_string(),
            MetricScore {
                score: ankle_score,
                feedback: format!("Peak dorsiflexion proxy ≈ {peak_dorsiflexion:.0}°."),
            },
        );

        let mut whats_right = Vec::new();
        if depth_score >= 80 {
            whats_right.push("Good squat depth.".to_string());
        }
        if torso_score >= 80 {
            whats_right.push("Solid torso control.".to_string());
        }
        if tracking_score >= 80 {
            whats_right.push("Knees tracking well.".to_string());
        }
        if ankle_score >= 80 {
            whats_right.push("Adequate ankle mobility.".to_string());
        }

        let mut corrections_needed = Vec::new();
        if tracking_score < 80 {
            corrections_needed.push(Correction {
                issue: "Knee valgus".to_string(),
                severity: if tracking_score < 60 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                feedback: "Knees show lateral drift vs toe line.".to_string(),
                correction_instruction:
                    "Screw feet into floor, push knees over 2nd–3rd toe; add mini-band warm-ups."
                        .to_string(),
            });
        }
        if depth_score < 80 {
            corrections_needed.push(Correction {
                issue: "Shallow depth".to_string(),
                severity: Severity::Warning,
                feedback: format!("Deepest knee angle {deepest_knee:.0}° suggests limited depth."),
                correction_instruction:
                    "Try light heel elevation and tempo squats (3–0–3) to build control."
                        .to_string(),
            });
        }
        if torso_score < 80 {
            corrections_needed.push(Correction {
                issue: "Excessive torso lean".to_string(),
                severity: if torso_score < 60 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                feedback: format!("Torso lean ≈ {torso_lean:.0}° may stress lower back."),
                correction_instruction:
                    "Brace and keep chest/hips rising together; try goblet squats.".to_string(),
            });
        }
        if ankle_score < 80 {
            corrections_needed.push(Correction {
                issue: "Limited ankle mobility".to_string(),
                severity: Severity::Info,
                feedback: format!(
                    "Peak dorsiflexion proxy ≈ {peak_dorsiflexion:.0}° suggests restricted ankle range."
                ),
                correction_instruction:
                    "Elevate heels slightly and add calf/ankle mobility work between sessions."
                        .to_string(),
            });
        }

        let summary = summary_sentence(overall_score, corrections_needed.len());

        AnalysisResult {
            overall_score,
            whats_right,
            corrections_needed,
            detailed_breakdown,
            improvement_tips: vec![
                "Film from ~45° front, full body in frame.".to_string(),
                "Brace before descent; exhale on top.".to_string(),
                "Tripod foot pressure; slow 2–3s eccentric.".to_string(),
            ],
            summary,
        }
    }
}

fn extract(frame: &PoseFrame, side: Side, width: f64, height: f64) -> Option<FrameMetrics> {
    let hip = frame.get(side.hip())?.point(width, height);
    let knee = frame.get(side.knee())?.point(width, height);
    let ankle = frame.get(side.ankle())?.point(width, height);
    let shoulder = frame.get(side.shoulder())?.point(width, height);
    let toe = frame.get(side.toe())?.point(width, height);

    let knee_angle = geometry::angle_at_vertex(hip, knee, ankle);
    let hip_angle = geometry::angle_at_vertex(shoulder, hip, knee);
    let torso_lean = geometry::angle_to_vertical(shoulder, hip).map(|angle| 180.0 - angle);
    let ankle_dorsiflexion = geometry::angle_at_vertex(knee, ankle, toe).map(|angle| 180.0 - angle);

    let knee_deviation = geometry::distance_point_to_line(knee, ankle, toe).and_then(|deviation| {
        let thigh_length = hip.distance(knee);
        (thigh_length > 0.0).then(|| deviation / thigh_length)
    });

    Some(FrameMetrics {
        knee_angle,
        hip_angle,
        torso_lean,
        ankle_dorsiflexion,
        knee_deviation,
        hip_height_vs_knee: hip.y - knee.y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::landmark::{Landmark, LandmarkName, LandmarkMap};

    /// Side-view squat skeleton with a parameterized knee angle. The torso
    /// stays vertical and the toe sits level with the ankle, so torso lean
    /// is 0° and the dorsiflexion proxy is 90°.
    fn squat_frame(index: usize, knee_angle_deg: f64) -> PoseFrame {
        let theta = knee_angle_deg.to_radians();
        let knee = (0.5, 0.7);
        let ankle = (0.5, 0.9);
        let hip = (knee.0 + 0.18 * theta.sin(), knee.1 + 0.18 * theta.cos());
        let shoulder = (hip.0, hip.1 - 0.3);
        let toe = (ankle.0 + 0.1, ankle.1);

        let mut landmarks = LandmarkMap::new();
        landmarks.insert(LandmarkName::LeftHip, Landmark::new(hip.0, hip.1, 1.0));
        landmarks.insert(LandmarkName::LeftKnee, Landmark::new(knee.0, knee.1, 1.0));
        landmarks.insert(LandmarkName::LeftAnkle, Landmark::new(ankle.0, ankle.1, 1.0));
        landmarks.insert(
            LandmarkName::LeftShoulder,
            Landmark::new(shoulder.0, shoulder.1, 1.0),
        );
        landmarks.insert(LandmarkName::LeftToe, Landmark::new(toe.0, toe.1, 1.0));
        PoseFrame::new(index, landmarks)
    }

    #[test]
    fn test_extracted_knee_angle_matches_construction() {
        let mut acc = SquatAccumulator::new();
        acc.observe(&squat_frame(0, 120.0), 1000.0, 1000.0);
        assert_eq!(acc.primary_samples(), 1);
        assert!((acc.knee_angles[0] - 120.0).abs() < 0.5);
        assert!(acc.torso_lean[0].abs() < 0.5);
        assert!((acc.ankle_dorsiflexion[0] - 90.0).abs() < 0.5);
    }

    #[test]
    fn test_degenerate_frame_contributes_nothing() {
        // All leg landmarks collapsed onto one point: every angle is
        // undefined and the frame must be silently skipped.
        let mut landmarks = LandmarkMap::new();
        for name in [
            LandmarkName::LeftHip,
            LandmarkName::LeftKnee,
            LandmarkName::LeftAnkle,
            LandmarkName::LeftShoulder,
            LandmarkName::LeftToe,
        ] {
            landmarks.insert(name, Landmark::new(0.5, 0.5, 1.0));
        }
        let frame = PoseFrame::new(0, landmarks);

        let mut acc = SquatAccumulator::new();
        acc.observe(&frame, 1000.0, 1000.0);
        assert_eq!(acc.primary_samples(), 0);
        assert!(acc.knee_deviation.is_empty());
    }

    #[test]
    fn test_missing_landmark_skips_frame() {
        let mut landmarks = LandmarkMap::new();
        landmarks.insert(LandmarkName::LeftHip, Landmark::new(0.5, 0.5, 1.0));
        let frame = PoseFrame::new(0, landmarks);

        let mut acc = SquatAccumulator::new();
        acc.observe(&frame, 1000.0, 1000.0);
        assert_eq!(acc.primary_samples(), 0);
    }

    #[test]
    fn test_deep_squat_scores_full_depth() {
        let mut acc = SquatAccumulator::new();
        for i in 0..20 {
            acc.observe(&squat_frame(i, 88.0), 1000.0, 1000.0);
        }
        let result = acc.finish();

        let depth = &result.detailed_breakdown["depth"];
        assert_eq!(depth.score, 95);
        assert!(result
            .whats_right
            .iter()
            .any(|s| s == "Good squat depth."));
    }

    #[test]
    fn test_shallow_squat_gets_depth_correction() {
        let mut acc = SquatAccumulator::new();
        for i in 0..20 {
            acc.observe(&squat_frame(i, 140.0), 1000.0, 1000.0);
        }
        let result = acc.finish();

        assert_eq!(result.detailed_breakdown["depth"].score, 50);
        let correction = result
            .corrections_needed
            .iter()
            .find(|c| c.issue == "Shallow depth")
            .expect("shallow depth correction");
        assert_eq!(correction.severity, Severity::Warning);
    }

    #[test]
    fn test_improvement_tips_always_emitted() {
        let mut acc = SquatAccumulator::new();
        for i in 0..5 {
            acc.observe(&squat_frame(i, 90.0), 1000.0, 1000.0);
        }
        let result = acc.finish();
        assert_eq!(result.improvement_tips.len(), 3);
    }
}
