/*
 * Responsibility
 * - HTTP に出るエラー (AppError) と起動時エラー (ModuleError) の定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - EngineError は中身を漏らさず 500 に変換する
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::engine::EngineError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Engine(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            AppError::BadRequest { code, message } => (code, message),
            AppError::Unauthorized => ("UNAUTHORIZED", "Unauthorized".into()),
            AppError::PayloadTooLarge { limit } => (
                "PAYLOAD_TOO_LARGE",
                format!("request body exceeds {limit} bytes"),
            ),
            AppError::Engine(err) => {
                tracing::error!(error = %err, "auth engine failure");
                ("INTERNAL_SERVER_ERROR", "internal server error".into())
            }
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "internal server error".into()),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

/// Startup-time failures. These stop the process before it serves traffic.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("routing provider is not configured (expected \"express\" or \"fastify\")")]
    MissingRoutingProvider,
    #[error("no provider registered for {0}")]
    MissingProvider(&'static str),
    #[error("invalid auth base path: {0:?}")]
    InvalidBasePath(String),
    #[error("auth module factory failed: {0}")]
    Factory(String),
}
