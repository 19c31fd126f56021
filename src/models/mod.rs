// Data models shared across the pipeline and the API layer

pub mod analysis;
pub mod landmark;

pub use analysis::{
    AnalysisError, AnalysisResult, Correction, Exercise, MetricScore, Severity,
};
pub use landmark::{Landmark, LandmarkMap, LandmarkName, PoseFrame, Side};
