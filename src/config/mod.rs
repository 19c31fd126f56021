pub mod app;

pub use app::{AnalysisConfig, AppConfig};
