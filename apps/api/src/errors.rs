use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::adapters::StageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Stage(#[from] StageError),

    /// Fatal run outcome carried out of the orchestrator, already reduced
    /// to its stage name and message.
    #[error("{message}")]
    Pipeline { stage: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, stage, message) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                None,
                msg.clone(),
            ),
            AppError::Stage(err) => {
                tracing::warn!(stage = err.stage(), "Stage failure: {err}");
                let (status, code) = match err {
                    StageError::Parse(_) => (StatusCode::UNPROCESSABLE_ENTITY, "PARSE_ERROR"),
                    StageError::Scrape(_) => (StatusCode::BAD_GATEWAY, "SCRAPE_ERROR"),
                    StageError::Score(_) => (StatusCode::BAD_GATEWAY, "SCORE_ERROR"),
                    StageError::EmailDispatch(_) => (StatusCode::BAD_GATEWAY, "EMAIL_ERROR"),
                    StageError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "STAGE_TIMEOUT"),
                };
                (status, code, Some(err.stage()), err.to_string())
            }
            AppError::Pipeline { stage, message } => {
                tracing::warn!(stage = %stage, "Run failed: {message}");
                let (status, code) = match stage.as_str() {
                    "parse" => (StatusCode::UNPROCESSABLE_ENTITY, "PARSE_ERROR"),
                    "scrape" => (StatusCode::BAD_GATEWAY, "SCRAPE_ERROR"),
                    "score" => (StatusCode::BAD_GATEWAY, "SCORE_ERROR"),
                    "email" => (StatusCode::BAD_GATEWAY, "EMAIL_ERROR"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_ERROR"),
                };
                (status, code, Some(stage.as_str()), message.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    None,
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    None,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "stage": stage,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_maps_to_unprocessable() {
        let resp = AppError::Stage(StageError::Parse("corrupt file".into())).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        let resp = AppError::Stage(StageError::Timeout {
            stage: "scrape",
            seconds: 30,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
