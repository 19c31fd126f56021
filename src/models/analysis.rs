/// Analysis request/response models and the pipeline's error contract.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exercises the pipeline can analyze. A closed set: each variant carries
/// its own feature extraction, aggregation policy, scoring tables, and
/// feedback templates, dispatched through exhaustive matches so a new
/// exercise is a compile-time-checked extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exercise {
    Squat,
    #[serde(rename = "pushup")]
    PushUp,
    Lunge,
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exercise::Squat => write!(f, "squat"),
            Exercise::PushUp => write!(f, "pushup"),
            Exercise::Lunge => write!(f, "lunge"),
        }
    }
}

impl FromStr for Exercise {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "squat" => Ok(Exercise::Squat),
            "pushup" | "push-up" => Ok(Exercise::PushUp),
            "lunge" => Ok(Exercise::Lunge),
            other => Err(AnalysisError::UnsupportedExercise(other.to_string())),
        }
    }
}

/// Severity of a correction item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One corrective issue with instructional text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub issue: String,
    pub severity: Severity,
    pub feedback: String,
    pub correction_instruction: String,
}

/// Subscore and feedback sentence for one metric group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricScore {
    pub score: u8,
    pub feedback: String,
}

/// The externally visible result of one video analysis. Constructed once
/// and never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_score: u8,
    pub whats_right: Vec<String>,
    pub corrections_needed: Vec<Correction>,
    pub detailed_breakdown: BTreeMap<String, MetricScore>,
    pub improvement_tips: Vec<String>,
    pub summary: String,
}

/// Recoverable analysis outcomes, surfaced to the caller as structured
/// errors. Per-frame geometric degeneracy is never an error; it only omits
/// that metric for that frame.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Could not open video.")]
    DecodeFailure,

    #[error("{0}")]
    InsufficientEvidence(String),

    #[error("Exercise '{0}' is not supported. Try 'squat', 'pushup', or 'lunge'.")]
    UnsupportedExercise(String),

    #[error("Internal analysis error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_exercise_parsing() {
        assert_eq!("squat".parse::<Exercise>().unwrap(), Exercise::Squat);
        assert_eq!("PushUp".parse::<Exercise>().unwrap(), Exercise::PushUp);
        assert_eq!("push-up".parse::<Exercise>().unwrap(), Exercise::PushUp);
        assert_eq!("LUNGE".parse::<Exercise>().unwrap(), Exercise::Lunge);
    }

    #[test]
    fn test_unknown_exercise_is_rejected() {
        let err = "burpee".parse::<Exercise>().unwrap_err();
        assert_matches!(err, AnalysisError::UnsupportedExercise(name) if name == "burpee");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn test_result_serializes_with_original_keys() {
        let result = AnalysisResult {
            overall_score: 84,
            whats_right: vec!["Good squat depth.".to_string()],
            corrections_needed: Vec::new(),
            detailed_breakdown: BTreeMap::new(),
            improvement_tips: Vec::new(),
            summary: "Good form with some areas for improvement.".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["overall_score"], 84);
        assert!(json.get("whats_right").is_some());
        assert!(json.get("corrections_needed").is_some());
        assert!(json.get("detailed_breakdown").is_some());
        assert!(json.get("improvement_tips").is_some());
    }
}
