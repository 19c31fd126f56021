// Analysis pipeline services

pub mod exercises;
pub mod form_analysis_service;
pub mod frame_source;
pub mod geometry;
pub mod pose_estimation_service;
pub mod scoring;
pub mod stats;
pub mod video_processing_service;

pub use form_analysis_service::FormAnalysisService;
pub use frame_source::{PoseFrameSource, SampledFrame, VideoPoseSource};
pub use pose_estimation_service::PoseEstimator;
pub use video_processing_service::VideoProcessingService;
