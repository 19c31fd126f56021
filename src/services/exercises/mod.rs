/// Per-exercise analysis: feature extraction, aggregation, scoring, and
/// feedback assembly.
pub mod lunge;
pub mod pushup;
pub mod squat;

pub use lunge::LungeAccumulator;
pub use pushup::PushUpAccumulator;
pub use squat::SquatAccumulator;

use crate::models::analysis::{AnalysisResult, Exercise};
use crate::models::landmark::PoseFrame;

/// Frame-by-frame accumulator for one analysis run, dispatched over the
/// closed exercise set.
#[derive(Debug)]
pub enum ExerciseAccumulator {
    Squat(SquatAccumulator),
    PushUp(PushUpAccumulator),
    Lunge(LungeAccumulator),
}

impl ExerciseAccumulator {
    pub fn new(exercise: Exercise) -> Self {
        match exercise {
            Exercise::Squat => Self::Squat(SquatAccumulator::new()),
            Exercise::PushUp => Self::PushUp(PushUpAccumulator::new()),
            Exercise::Lunge => Self::Lunge(LungeAccumulator::new()),
        }
    }

    /// Extract this frame's metrics and append them to the series.
    pub fn observe(&mut self, frame: &PoseFrame, width: f64, height: f64) {
        match self {
            Self::Squat(acc) => acc.observe(frame, width, height),
            Self::PushUp(acc) => acc.observe(frame, width, height),
            Self::Lunge(acc) => acc.observe(frame, width, height),
        }
    }

    /// Frames that yielded the exercise's primary flexion metric.
    pub fn primary_samples(&self) -> usize {
        match self {
            Self::Squat(acc) => acc.primary_samples(),
            Self::PushUp(acc) => acc.primary_samples(),
            Self::Lunge(acc) => acc.primary_samples(),
        }
    }

    /// User-facing message for the insufficient-evidence outcome.
    pub fn insufficient_evidence_message(&self) -> &'static str {
        match self {
            Self::Squat(_) => squat::INSUFFICIENT_EVIDENCE,
            Self::PushUp(_) => pushup::INSUFFICIENT_EVIDENCE,
            Self::Lunge(_) => lunge::INSUFFICIENT_EVIDENCE,
        }
    }

    /// Aggregate, score, and assemble the final result.
    pub fn finish(self) -> AnalysisResult {
        match self {
            Self::Squat(acc) => acc.finish(),
            Self::PushUp(acc) => acc.finish(),
            Self::Lunge(acc) => acc.finish(),
        }
    }
}

/// Overall-score banded summary sentence.
pub(crate) fn summary_sentence(overall_score: u8, correction_count: usize) -> String {
    if overall_score >= 90 {
        "Excellent form! Minor adjustments can make it perfect.".to_string()
    } else if overall_score >= 80 {
        "Good form with some areas for improvement.".to_string()
    } else if overall_score >= 70 {
        "Fair form. Focus on the corrections below.".to_string()
    } else {
        format!(
            "Needs work. Focus on these {correction_count} key areas to improve safety and effectiveness."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_bands() {
        assert!(summary_sentence(92, 0).starts_with("Excellent"));
        assert!(summary_sentence(85, 1).starts_with("Good"));
        assert!(summary_sentence(73, 2).starts_with("Fair"));
        assert!(summary_sentence(60, 3).contains("3 key areas"));
    }

    #[test]
    fn test_accumulator_dispatch_matches_exercise() {
        assert!(matches!(
            ExerciseAccumulator::new(Exercise::Squat),
            ExerciseAccumulator::Squat(_)
        ));
        assert!(matches!(
            ExerciseAccumulator::new(Exercise::PushUp),
            ExerciseAccumulator::PushUp(_)
        ));
        assert!(matches!(
            ExerciseAccumulator::new(Exercise::Lunge),
            ExerciseAccumulator::Lunge(_)
        ));
    }
}
