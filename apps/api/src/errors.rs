use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::latex::compiler::CompileError;
use crate::latex::render::ConversionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Compilation error: {0}")]
    Compile(#[from] CompileError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnprocessableEntity(_) | AppError::Conversion(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Compile(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::Compile(e) if e.is_provisioning() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Compile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => ("UNPROCESSABLE_ENTITY", msg.clone()),
            AppError::Compile(e) if e.is_timeout() => {
                tracing::error!("Compile timeout: {e}");
                (
                    "COMPILE_TIMEOUT",
                    "LaTeX compilation timed out".to_string(),
                )
            }
            AppError::Compile(e) if e.is_provisioning() => {
                tracing::error!("Toolchain unavailable: {e}");
                (
                    "TOOLCHAIN_UNAVAILABLE",
                    "The LaTeX toolchain is not available".to_string(),
                )
            }
            AppError::Compile(e) => {
                tracing::error!("Compile error: {e}");
                (
                    "COMPILATION_FAILED",
                    "LaTeX compilation failed".to_string(),
                )
            }
            AppError::Conversion(e) => {
                tracing::error!("Conversion error: {e}");
                (
                    "CONVERSION_FAILED",
                    "Could not convert the PDF to LaTeX".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
