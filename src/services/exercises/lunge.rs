/// Lunge analysis: per-frame feature extraction, aggregation policy,
/// scoring tables, and feedback templates.
///
/// Unlike squat and push-up, the lunge needs BOTH legs every frame: the
/// more flexed knee identifies the front leg before any front-leg metric
/// is computed. Shin and torso angles use the same deviation-from-upright
/// convention as the squat (0° = vertical, lower is better).
use std::collections::BTreeMap;

use tracing::debug;

use crate::models::analysis::{AnalysisResult, Correction, MetricScore, Severity};
use crate::models::landmark::{PoseFrame, Side};
use crate::services::exercises::summary_sentence;
use crate::services::geometry;
use crate::services::scoring::{band_distance, weighted_overall, Direction, ThresholdTable};
use crate::services::stats;

static DEPTH: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(95.0, 95), (110.0, 85), (125.0, 70)],
    50,
);

static SHIN: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(15.0, 95), (25.0, 80), (35.0, 65)],
    50,
);

static TORSO: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(15.0, 95), (25.0, 80), (35.0, 65)],
    50,
);

static TRACKING: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(0.15, 95), (0.25, 80), (0.35, 65)],
    50,
);

/// Scored on the distance outside the target band [0.6, 1.2] of
/// feet-width / pelvis-width.
static STEP_WIDTH: ThresholdTable =
    ThresholdTable::new(Direction::LowerIsBetter, &[(0.0, 95), (0.2, 80)], 60);

static STABILITY: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(0.01, 95), (0.02, 80), (0.03, 65)],
    50,
);

const DEPTH_WEIGHT: f64 = 0.30;
const TRACKING_WEIGHT: f64 = 0.20;
const SHIN_WEIGHT: f64 = 0.15;
const TORSO_WEIGHT: f64 = 0.15;
const STEP_WIDTH_WEIGHT: f64 = 0.10;
const STABILITY_WEIGHT: f64 = 0.10;

const STEP_WIDTH_BAND: (f64, f64) = (0.6, 1.2);

/// Wobble needs a few samples before a spread is meaningful.
const MIN_WOBBLE_SAMPLES: usize = 5;

pub const INSUFFICIENT_EVIDENCE: &str =
    "Not enough pose detections to analyze lunges. Try full-body framing, good lighting, and slower reps.";

/// Accumulates metric series across sampled frames.
#[derive(Debug, Default)]
pub struct LungeAccumulator {
    front_knee_angles: Vec<f64>,
    shin_angles: Vec<f64>,
    torso_lean: Vec<f64>,
    knee_deviation: Vec<f64>,
    step_width_ratios: Vec<f64>,
    stride_length_ratios: Vec<f64>,
    front_knee_x: Vec<f64>,
    frame_width: f64,
}

impl LungeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, frame: &PoseFrame, width: f64, height: f64) {
        self.frame_width = width;

        let left = match leg_points(frame, Side::Left, width, height) {
            Some(points) => points,
            None => return,
        };
        let right = match leg_points(frame, Side::Right, width, height) {
            Some(points) => points,
            None => return,
        };

        // Both knee angles must be defined to classify the front leg.
        let left_knee_angle = geometry::angle_at_vertex(left.hip, left.knee, left.ankle);
        let right_knee_angle = geometry::angle_at_vertex(right.hip, right.knee, right.ankle);
        let (Some(left_angle), Some(right_angle)) = (left_knee_angle, right_knee_angle) else {
            return;
        };

        // The more flexed knee is the front leg.
        let (front, front_angle) = if left_angle < right_angle {
            (left, left_angle)
        } else {
            (right, right_angle)
        };

        self.front_knee_angles.push(front_angle);

        if let Some(angle) = geometry::angle_to_vertical(front.knee, front.ankle) {
            self.shin_angles.push(180.0 - angle);
        }
        if let Some(angle) = geometry::angle_to_vertical(front.shoulder, front.hip) {
            self.torso_lean.push(180.0 - angle);
        }

        if let Some(deviation) = geometry::distance_point_to_line(front.knee, front.ankle, front.toe)
        {
            let thigh_length = front.hip.distance(front.knee);
            if thigh_length > 0.0 {
                self.knee_deviation.push(deviation / thigh_length);
            }
        }

        let pelvis_width = left.hip.distance(right.hip);
        if pelvis_width > 0.0 {
            self.step_width_ratios
                .push((left.toe.x - right.toe.x).abs() / pelvis_width);
        }

        let leg_length = front.hip.distance(front.ankle);
        if leg_length > 0.0 {
            self.stride_length_ratios
                .push((left.toe.y - right.toe.y).abs() / leg_length);
        }

        self.front_knee_x.push(front.knee.x);
    }

    /// Number of frames that yielded the primary flexion metric.
    pub fn primary_samples(&self) -> usize {
        self.front_knee_angles.len()
    }

    pub fn finish(self) -> AnalysisResult {
        let deepest_front_knee = stats::percentile(&self.front_knee_angles, 10.0);
        let median_shin = stats::median(&self.shin_angles);
        let median_torso = stats::median(&self.torso_lean);
        let peak_deviation = stats::percentile(&self.knee_deviation, 90.0);
        let median_step_width = stats::median(&self.step_width_ratios);

        debug!(
            median_stride_length = stats::median(&self.stride_length_ratios),
            "unscored lunge biomechanics"
        );

        // Frame-to-frame x-jitter of the front knee, normalized by frame
        // width.
        let wobble = if self.front_knee_x.len() >= MIN_WOBBLE_SAMPLES && self.frame_width > 0.0 {
            stats::sample_std_dev(&self.front_knee_x) / self.frame_width
        } else {
            0.0
        };

        let depth_score = DEPTH.score(deepest_front_knee);
        let shin_score = SHIN.score(median_shin);
        let torso_score = TORSO.score(median_torso);
        let tracking_score = TRACKING.score(peak_deviation);
        let step_width_score = STEP_WIDTH.score(band_distance(
            median_step_width,
            STEP_WIDTH_BAND.0,
            STEP_WIDTH_BAND.1,
        ));
        let stability_score = STABILITY.score(wobble);

        let overall_score = weighted_overall(&[
            (depth_score, DEPTH_WEIGHT),
            (tracking_score, TRACKING_WEIGHT),
            (shin_score, SHIN_WEIGHT),
            (torso_score, TORSO_WEIGHT),
            (step_width_score, STEP_WIDTH_WEIGHT),
            (stability_score, STABILITY_WEIGHT),
        ]);

        let mut detailed_breakdown = BTreeMap::new();
        detailed_breakdown.insert(
            "front_knee_depth".to_string(),
            MetricScore {
                score: depth_score,
                feedback: format!(
                    "Deepest front-knee angle ≈ {deepest_front_knee:.0}°. Aim ~90–110°."
                ),
            },
        );
        detailed_breakdown.insert(
            "knee_tracking".to_string(),
            MetricScore {
                score: tracking_score,
                feedback: format!(
                    "Peak lateral knee drift (normalized) ≈ {peak_deviation:.2}. Track knee over 2nd–3rd toe."
                ),
            },
        );
        detailed_breakdown.insert(
            "shin_angle".to_string(),
            MetricScore {
                score: shin_score,
                feedback: format!(
                    "Median shin angle vs vertical ≈ {median_shin:.0}°. Keep tibia more upright if you feel knee stress."
                ),
            },
        );
        detailed_breakdown.insert(
            "torso_alignment".to_string(),
            MetricScore {
                score: torso_score,
                feedback: format!(
                    "Median torso lean ≈ {median_torso:.0}°. Brace and keep ribs stacked over hips."
                ),
            },
        );
        detailed_breakdown.insert(
            "step_width".to_string(),
            MetricScore {
                score: step_width_score,
                feedback: format!(
                    "Step width ratio ≈ {median_step_width:.2} (feet width / pelvis width). Avoid tightrope stance."
                ),
            },
        );
        detailed_breakdown.insert(
            "stability".to_string(),
            MetricScore {
                score: stability_score,
                feedback: format!(
                    "Knee path wobble (normalized) ≈ {wobble:.3}. Slow the descent; focus on tripod foot."
                ),
            },
        );

        let mut whats_right = Vec::new();
        if depth_score >= 80 {
            whats_right.push("Good lunge depth on the front leg.".to_string());
        }
        if tracking_score >= 80 {
            whats_right.push("Front knee tracks well over the toes.".to_string());
        }
        if step_width_score >= 80 {
            whats_right.push("Solid step width for balance.".to_string());
        }
        if stability_score >= 80 {
            whats_right.push("Stable knee path through reps.".to_string());
        }
        if torso_score >= 80 {
            whats_right.push("Upright torso and good bracing.".to_string());
        }
        if shin_score >= 80 {
            whats_right.push("Appropriate shin angle.".to_string());
        }

        let mut corrections_needed = Vec::new();
        if tracking_score < 80 {
            corrections_needed.push(Correction {
                issue: "Front knee valgus/varus".to_string(),
                severity: if tracking_score < 60 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                feedback: "The front knee drifts laterally relative to the foot line.".to_string(),
                correction_instruction:
                    "Press the front foot evenly (tripod) and guide the knee over the 2nd–3rd toe. Slow tempo to build control."
                        .to_string(),
            });
        }
        if depth_score < 80 {
            corrections_needed.push(Correction {
                issue: "Shallow front-knee depth".to_string(),
                severity: Severity::Warning,
                feedback: format!(
                    "Deepest front-knee angle ≈ {deepest_front_knee:.0}°, suggesting limited range."
                ),
                correction_instruction:
                    "Take a slightly longer stride, drop the back knee more vertically, and keep the front heel rooted. Try bodyweight tempo lunges (3–0–3)."
                        .to_string(),
            });
        }
        if shin_score < 80 {
            corrections_needed.push(Correction {
                issue: "Excessive shin angle".to_string(),
                severity: Severity::Warning,
                feedback: format!("Shin angle vs vertical ≈ {median_shin:.0}°."),
                correction_instruction:
                    "Scoot the front foot forward a touch and descend more vertically. Keep the knee stacked over the mid-foot."
                        .to_string(),
            });
        }
        if torso_score < 80 {
            corrections_needed.push(Correction {
                issue: "Torso leaning forward".to_string(),
                severity: if torso_score < 60 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                feedback: format!(
                    "Torso lean ≈ {median_torso:.0}° may indicate poor bracing or stride setup."
                ),
                correction_instruction:
                    "Big breath into the belly/obliques before each rep; keep ribs stacked over hips. Goblet reverse lunges help groove posture."
                        .to_string(),
            });
        }
        if step_width_score < 80 {
            corrections_needed.push(Correction {
                issue: "Tightrope stance".to_string(),
                severity: Severity::Info,
                feedback: format!(
                    "Step width ratio ≈ {median_step_width:.2}, which may reduce balance."
                ),
                correction_instruction:
                    "Set the feet hip-width apart like two rails, not a single line. Maintain that width during the step."
                        .to_string(),
            });
        }
        if stability_score < 80 {
            corrections_needed.push(Correction {
                issue: "Knee wobble".to_string(),
                severity: Severity::Warning,
                feedback: "Notable side-to-side front-knee movement frame-to-frame.".to_string(),
                correction_instruction:
                    "Slow the eccentric (2–3s), focus the knee toward the 2nd–3rd toe, and use light support (fingertips on a rack) while learning."
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
                "Film at ~45° front angle with the entire body in frame.".to_string(),
                "Brace before each rep: inhale, ribs down, descend vertically; exhale at the top."
                    .to_string(),
                "Keep the front heel heavy; think 'down not forward'.".to_string(),
                "Use a slow 2–3s descent to control tracking and stability.".to_string(),
                "Practice stationary split squats to build balance before dynamic lunges."
                    .to_string(),
            ],
            summary,
        }
    }
}

/// Pixel-space leg and torso points for one side.
#[derive(Debug, Clone, Copy)]
struct LegPoints {
    shoulder: geometry::Point,
    hip: geometry::Point,
    knee: geometry::Point,
    ankle: geometry::Point,
    toe: geometry::Point,
}

fn leg_points(frame: &PoseFrame, side: Side, width: f64, height: f64) -> Option<LegPoints> {
    Some(LegPoints {
        shoulder: frame.get(side.shoulder())?.point(width, height),
        hip: frame.get(side.hip())?.point(width, height),
        knee: frame.get(side.knee())?.point(width, height),
        ankle: frame.get(side.ankle())?.point(width, height),
        toe: frame.get(side.toe())?.point(width, height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::landmark::{Landmark, LandmarkMap, LandmarkName};

    /// A lunge stance viewed from ~45°: left leg forward and flexed, right
    /// leg trailing and nearly straight.
    fn lunge_frame(index: usize, front_knee_x: f64) -> PoseFrame {
        let mut landmarks = LandmarkMap::new();
        let mut put = |name: LandmarkName, x: f64, y: f64| {
            landmarks.insert(name, Landmark::new(x, y, 1.0));
        };

        // Front (left) leg: knee flexed roughly 90°.
        put(LandmarkName::LeftShoulder, 0.45, 0.25);
        put(LandmarkName::LeftHip, 0.45, 0.55);
        put(LandmarkName::LeftKnee, front_knee_x, 0.56);
        put(LandmarkName::LeftAnkle, front_knee_x, 0.75);
        put(LandmarkName::LeftToe, front_knee_x + 0.05, 0.76);

        // Back (right) leg: nearly straight behind.
        put(LandmarkName::RightShoulder, 0.47, 0.25);
        put(LandmarkName::RightHip, 0.5, 0.55);
        put(LandmarkName::RightKnee, 0.55, 0.67);
        put(LandmarkName::RightAnkle, 0.6, 0.79);
        put(LandmarkName::RightToe, 0.63, 0.8);

        PoseFrame::new(index, landmarks)
    }

    #[test]
    fn test_front_leg_is_the_more_flexed_one() {
        let mut acc = LungeAccumulator::new();
        acc.observe(&lunge_frame(0, 0.6), 1000.0, 1000.0);
        assert_eq!(acc.primary_samples(), 1);
        // The left knee is sharply flexed; the right is nearly straight.
        assert!(acc.front_knee_angles[0] < 120.0);
        // Front-knee x samples come from the left (front) knee.
        assert!((acc.front_knee_x[0] - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_knee_skips_frame() {
        let mut frame_landmarks = LandmarkMap::new();
        for name in LandmarkName::all() {
            frame_landmarks.insert(name, Landmark::new(0.5, 0.5, 1.0));
        }
        let frame = PoseFrame::new(0, frame_landmarks);

        let mut acc = LungeAccumulator::new();
        acc.observe(&frame, 1000.0, 1000.0);
        assert_eq!(acc.primary_samples(), 0);
    }

    #[test]
    fn test_wobble_requires_minimum_samples() {
        let mut acc = LungeAccumulator::new();
        for i in 0..3 {
            acc.observe(&lunge_frame(i, 0.6), 1000.0, 1000.0);
        }
        let result = acc.finish();
        // Fewer than five samples: wobble treated as zero, full score.
        assert_eq!(result.detailed_breakdown["stability"].score, 95);
    }

    #[test]
    fn test_steady_knee_scores_stable() {
        let mut acc = LungeAccumulator::new();
        for i in 0..12 {
            acc.observe(&lunge_frame(i, 0.6), 1000.0, 1000.0);
        }
        let result = acc.finish();
        assert_eq!(result.detailed_breakdown["stability"].score, 95);
        assert!(result
            .whats_right
            .iter()
            .any(|s| s == "Stable knee path through reps."));
    }

    #[test]
    fn test_wobbly_knee_gets_correction() {
        let mut acc = LungeAccumulator::new();
        for i in 0..12 {
            // Alternate the front knee between two x positions 5% of the
            // frame width apart.
            let x = if i % 2 == 0 { 0.58 } else { 0.63 };
            acc.observe(&lunge_frame(i, x), 1000.0, 1000.0);
        }
        let result = acc.finish();
        assert!(result.detailed_breakdown["stability"].score < 80);
        assert!(result
            .corrections_needed
            .iter()
            .any(|c| c.issue == "Knee wobble"));
    }

    #[test]
    fn test_all_six_groups_in_breakdown() {
        let mut acc = LungeAccumulator::new();
        for i in 0..6 {
            acc.observe(&lunge_frame(i, 0.6), 1000.0, 1000.0);
        }
        let result = acc.finish();
        for key in [
            "front_knee_depth",
            "knee_tracking",
            "shin_angle",
            "torso_alignment",
            "step_width",
            "stability",
        ] {
            assert!(result.detailed_breakdown.contains_key(key), "missing {key}");
        }
    }
}
