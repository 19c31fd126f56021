//! Exercise form analysis: pose-landmark based scoring and coaching
//! feedback for squat, push-up, and lunge videos.

pub mod api;
pub mod config;
pub mod models;
pub mod services;
