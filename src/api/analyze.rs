/// Video upload and analysis endpoint.
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::analysis::{AnalysisError, AnalysisResult, Exercise};
use crate::services::FormAnalysisService;

/// Shared state for API handlers.
pub struct AppState {
    pub config: AppConfig,
}

/// Accepted upload extensions, matching the container formats the decoder
/// handles.
const ALLOWED_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "webm"];

/// Analyze an uploaded exercise video.
///
/// Multipart form: `video` (required file) and `exercise_type` (optional,
/// defaults to squat). The upload lands in a temp file that is removed
/// when the analysis finishes, whichever way it exits.
pub async fn analyze_exercise(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let request_id = Uuid::new_v4();

    let mut video_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut exercise_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!(%request_id, "failed to read multipart field: {e}");
        ApiError::InvalidRequest("Failed to read upload data".to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "video" => {
                file_name = field.file_name().map(|s| s.to_string());
                video_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            error!(%request_id, "failed to read video bytes: {e}");
                            ApiError::InvalidRequest("Failed to read video data".to_string())
                        })?
                        .to_vec(),
                );
            }
            "exercise_type" => {
                let bytes = field.bytes().await.map_err(|_| {
                    ApiError::InvalidRequest("Failed to read exercise_type".to_string())
                })?;
                exercise_type = Some(String::from_utf8_lossy(&bytes).to_string());
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let video_data = video_data
        .ok_or_else(|| ApiError::InvalidRequest("Missing 'video' file field".to_string()))?;
    if video_data.is_empty() {
        return Err(ApiError::InvalidRequest("Empty video upload".to_string()));
    }

    let extension = file_name
        .as_deref()
        .and_then(extension_of)
        .ok_or_else(|| ApiError::InvalidRequest("Missing upload filename".to_string()))?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::InvalidRequest(format!(
            "Unsupported format '.{extension}'. Use one of: mp4, mov, avi, mkv, webm"
        )));
    }

    let exercise = Exercise::from_str(exercise_type.as_deref().unwrap_or("squat"))?;

    info!(
        %request_id,
        %exercise,
        upload_bytes = video_data.len(),
        "analysis request accepted"
    );

    let analysis_config = state.config.analysis.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut upload = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{extension}"))
            .tempfile()
            .map_err(|e| AnalysisError::Internal(e.into()))?;
        upload
            .write_all(&video_data)
            .map_err(|e| AnalysisError::Internal(e.into()))?;

        let service = FormAnalysisService::new(analysis_config);
        service.analyze_video(upload.path(), exercise)
        // `upload` drops here, deleting the temp file on every path.
    })
    .await
    .map_err(|e| {
        error!(%request_id, "analysis task panicked: {e}");
        ApiError::Internal
    })??;

    info!(%request_id, overall_score = result.overall_score, "analysis request complete");
    Ok(Json(result))
}

fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// API errors, mapped to the original service's status conventions: every
/// recoverable analysis outcome is a 400 with `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Analysis(AnalysisError::Internal(err)) => {
                error!("analysis failed internally: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Analysis(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
