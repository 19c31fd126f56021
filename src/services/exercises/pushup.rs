/// Push-up analysis: per-frame feature extraction, aggregation policy,
/// scoring tables, and feedback templates.
use std::collections::BTreeMap;

use crate::models::analysis::{AnalysisResult, Correction, MetricScore, Severity};
use crate::models::landmark::{PoseFrame, Side};
use crate::services::exercises::summary_sentence;
use crate::services::geometry::{self, Point};
use crate::services::scoring::{weighted_overall, Direction, ThresholdTable};
use crate::services::stats;

static ELBOW: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(70.0, 95), (90.0, 85), (110.0, 70)],
    55,
);

static BODY_LINE: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(0.04, 95), (0.07, 82), (0.12, 68)],
    50,
);

static NECK: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(10.0, 95), (20.0, 82), (30.0, 68)],
    55,
);

static HAND: ThresholdTable = ThresholdTable::new(
    Direction::LowerIsBetter,
    &[(0.5, 95), (0.8, 82), (1.1, 68)],
    55,
);

const ELBOW_WEIGHT: f64 = 0.35;
const BODY_WEIGHT: f64 = 0.35;
const NECK_WEIGHT: f64 = 0.15;
const HAND_WEIGHT: f64 = 0.15;

pub const INSUFFICIENT_EVIDENCE: &str =
    "Not enough pose detections for push-up. Use a side view and good lighting.";

#[derive(Debug, Clone, Copy)]
struct FrameMetrics {
    elbow_angle: Option<f64>,
    body_deviation: Option<f64>,
    neck_tilt: Option<f64>,
    hand_offset: Option<f64>,
}

/// Accumulates metric series across sampled frames.
#[derive(Debug, Default)]
pub struct PushUpAccumulator {
    elbow_angles: Vec<f64>,
    body_deviation: Vec<f64>,
    neck_tilt: Vec<f64>,
    hand_offset: Vec<f64>,
}

impl PushUpAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, frame: &PoseFrame, width: f64, height: f64) {
        let side = frame.arm_side();
        let Some(metrics) = extract(frame, side, width, height) else {
            return;
        };

        if let Some(angle) = metrics.elbow_angle {
            self.elbow_angles.push(angle);
        }
        if let Some(deviation) = metrics.body_deviation {
            self.body_deviation.push(deviation);
        }
        if let Some(tilt) = metrics.neck_tilt {
            self.neck_tilt.push(tilt);
        }
        if let Some(offset) = metrics.hand_offset {
            self.hand_offset.push(offset);
        }
    }

    /// Number of frames that yielded the primary flexion metric.
    pub fn primary_samples(&self) -> usize {
        self.elbow_angles.len()
    }

    pub fn finish(self) -> AnalysisResult {
        let bottom_elbow = stats::percentile(&self.elbow_angles, 10.0);
        let median_deviation = stats::median(&self.body_deviation);
        let median_neck = stats::median(&self.neck_tilt);
        let median_hand = stats::median(&self.hand_offset);

        let elbow_score = ELBOW.score(bottom_elbow);
        let body_score = BODY_LINE.score(median_deviation);
        let neck_score = NECK.score(median_neck);
        let hand_score = HAND.score(median_hand);

        let overall_score = weighted_overall(&[
            (elbow_score, ELBOW_WEIGHT),
            (body_score, BODY_WEIGHT),
            (neck_score, NECK_WEIGHT),
            (hand_score, HAND_WEIGHT),
        ]);

        let mut detailed_breakdown = BTreeMap::new();
        detailed_breakdown.insert(
            "elbow_depth".to_string(),
            MetricScore {
                score: elbow_score,
                feedback: format!("Bottom elbow angle ≈ {bottom_elbow:.0}°."),
            },
        );
        detailed_breakdown.insert(
            "body_line".to_string(),
            MetricScore {
                score: body_score,
                feedback: format!("Hip deviation (normalized) ≈ {median_deviation:.2}."),
            },
        );
        detailed_breakdown.insert(
            "neck_alignment".to_string(),
            MetricScore {
                score: neck_score,
                feedback: format!("Neck tilt ≈ {median_neck:.0}°."),
            },
        );
        detailed_breakdown.insert(
            "hand_placement".to_string(),
            MetricScore {
                score: hand_score,
                feedback: format!("Hand offset ≈ {median_hand:.2}× upper-arm length."),
            },
        );

        let mut whats_right = Vec::new();
        if elbow_score >= 80 {
            whats_right.push("Solid push-up depth.".to_string());
        }
        if body_score >= 80 {
            whats_right.push("Strong plank line.".to_string());
        }
        if neck_score >= 80 {
            whats_right.push("Neutral head/neck.".to_string());
        }
        if hand_score >= 80 {
            whats_right.push("Good hand stacking.".to_string());
        }

        let mut corrections_needed = Vec::new();
        if elbow_score < 80 {
            corrections_needed.push(Correction {
                issue: "Shallow depth".to_string(),
                severity: if elbow_score < 60 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                feedback: format!("Bottom elbow angle ~{bottom_elbow:.0}° indicates limited depth."),
                correction_instruction:
                    "Use incline push-ups to keep full ROM without losing body line. Slow 2–3s descent."
                        .to_string(),
            });
        }
        if body_score < 80 {
            corrections_needed.push(Correction {
                issue: "Hip sag/pike".to_string(),
                severity: if body_score < 60 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                feedback: "Hips not aligned with shoulders/ankles.".to_string(),
                correction_instruction:
                    "Squeeze glutes/quads and keep ribs down; reduce reps if the line breaks."
                        .to_string(),
            });
        }
        if neck_score < 80 {
            corrections_needed.push(Correction {
                issue: "Neck not neutral".to_string(),
                severity: Severity::Info,
                feedback: "Head position suggests craning or dropping.".to_string(),
                correction_instruction: "Gaze 30–50 cm ahead; keep the back of your head long."
                    .to_string(),
            });
        }
        if hand_score < 80 {
            corrections_needed.push(Correction {
                issue: "Hands not under shoulders".to_string(),
                severity: Severity::Warning,
                feedback: "Hands appear too far forward/back or width off.".to_string(),
                correction_instruction: "Stack wrists under shoulders; screw hands into floor."
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
                "Film from the side; include wrists to ankles.".to_string(),
                "Brace like a plank (glutes + quads on).".to_string(),
                "Use tempo (3s down, 1s up) for control.".to_string(),
            ],
            summary,
        }
    }
}

fn extract(frame: &PoseFrame, side: Side, width: f64, height: f64) -> Option<FrameMetrics> {
    let shoulder = frame.get(side.shoulder())?.point(width, height);
    let elbow = frame.get(side.elbow())?.point(width, height);
    let wrist = frame.get(side.wrist())?.point(width, height);
    let hip = frame.get(side.hip())?.point(width, height);
    let ankle = frame.get(side.ankle())?.point(width, height);
    let ear = frame.get(side.ear())?.point(width, height);

    let elbow_angle = geometry::angle_at_vertex(shoulder, elbow, wrist);

    let body_deviation =
        geometry::distance_point_to_line(hip, shoulder, ankle).and_then(|deviation| {
            let trunk_length = shoulder.distance(ankle);
            (trunk_length > 0.0).then(|| deviation / trunk_length)
        });

    // Shoulder-to-ear vector against the horizontal axis, expressed as an
    // angle at the shoulder toward a unit +x reference point.
    let horizontal_ref = Point::new(shoulder.x + 1.0, shoulder.y);
    let neck_tilt = geometry::angle_at_vertex(ear, shoulder, horizontal_ref);

    let hand_offset = {
        let upper_arm_length = shoulder.distance(elbow);
        (upper_arm_length > 0.0).then(|| (wrist.x - shoulder.x).abs() / upper_arm_length)
    };

    Some(FrameMetrics {
        elbow_angle,
        body_deviation,
        neck_tilt,
        hand_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::landmark::{Landmark, LandmarkMap, LandmarkName};

    /// Side-view push-up skeleton with a parameterized horizontal wrist
    /// offset (in upper-arm lengths). The hip sits exactly on the
    /// shoulder-ankle line and the ear is almost level with the shoulder.
    fn pushup_frame(index: usize, hand_offset: f64) -> PoseFrame {
        let shoulder = (0.3, 0.5);
        let elbow = (0.3, 0.6); // upper arm 0.1 straight down
        let wrist = (0.3 + hand_offset * 0.1, 0.7);
        let hip = (0.6, 0.55);
        let ankle = (0.9, 0.6);
        let ear = (0.35, 0.498);

        let mut landmarks = LandmarkMap::new();
        landmarks.insert(
            LandmarkName::LeftShoulder,
            Landmark::new(shoulder.0, shoulder.1, 1.0),
        );
        landmarks.insert(LandmarkName::LeftElbow, Landmark::new(elbow.0, elbow.1, 1.0));
        landmarks.insert(LandmarkName::LeftWrist, Landmark::new(wrist.0, wrist.1, 1.0));
        landmarks.insert(LandmarkName::LeftHip, Landmark::new(hip.0, hip.1, 1.0));
        landmarks.insert(LandmarkName::LeftAnkle, Landmark::new(ankle.0, ankle.1, 1.0));
        landmarks.insert(LandmarkName::LeftEar, Landmark::new(ear.0, ear.1, 1.0));
        PoseFrame::new(index, landmarks)
    }

    #[test]
    fn test_hand_offset_extraction() {
        let mut acc = PushUpAccumulator::new();
        acc.observe(&pushup_frame(0, 0.6), 1000.0, 1000.0);
        assert_eq!(acc.hand_offset.len(), 1);
        assert!((acc.hand_offset[0] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_body_line_on_axis_has_zero_deviation() {
        let mut acc = PushUpAccumulator::new();
        acc.observe(&pushup_frame(0, 0.4), 1000.0, 1000.0);
        assert!(acc.body_deviation[0] < 1e-9);
    }

    #[test]
    fn test_wide_hand_offset_scores_82_with_warning() {
        let mut acc = PushUpAccumulator::new();
        for i in 0..10 {
            acc.observe(&pushup_frame(i, 0.6), 1000.0, 1000.0);
        }
        let result = acc.finish();

        assert_eq!(result.detailed_breakdown["hand_placement"].score, 82);
        let correction = result
            .corrections_needed
            .iter()
            .find(|c| c.issue == "Hands not under shoulders")
            .expect("hand placement correction");
        assert_eq!(correction.severity, Severity::Warning);
    }

    #[test]
    fn test_stacked_hands_score_95() {
        let mut acc = PushUpAccumulator::new();
        for i in 0..10 {
            acc.observe(&pushup_frame(i, 0.2), 1000.0, 1000.0);
        }
        let result = acc.finish();
        assert_eq!(result.detailed_breakdown["hand_placement"].score, 95);
        assert!(result
            .whats_right
            .iter()
            .any(|s| s == "Good hand stacking."));
    }

    #[test]
    fn test_neck_info_severity() {
        // Ear pulled far above the shoulder: neck tilt well past 30°.
        let mut landmarks = LandmarkMap::new();
        landmarks.insert(LandmarkName::LeftShoulder, Landmark::new(0.3, 0.5, 1.0));
        landmarks.insert(LandmarkName::LeftElbow, Landmark::new(0.3, 0.6, 1.0));
        landmarks.insert(LandmarkName::LeftWrist, Landmark::new(0.33, 0.7, 1.0));
        landmarks.insert(LandmarkName::LeftHip, Landmark::new(0.6, 0.55, 1.0));
        landmarks.insert(LandmarkName::LeftAnkle, Landmark::new(0.9, 0.6, 1.0));
        landmarks.insert(LandmarkName::LeftEar, Landmark::new(0.31, 0.4, 1.0));
        let frame = PoseFrame::new(0, landmarks);

        let mut acc = PushUpAccumulator::new();
        for _ in 0..5 {
            acc.observe(&frame, 1000.0, 1000.0);
        }
        let result = acc.finish();

        let correction = result
            .corrections_needed
            .iter()
            .find(|c| c.issue == "Neck not neutral")
            .expect("neck correction");
        assert_eq!(correction.severity, Severity::Info);
    }
}
