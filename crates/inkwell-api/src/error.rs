//! HTTP error mapping.
//!
//! Handlers return [`HttpAppError`], a thin wrapper that renders any
//! [`AppError`] as a JSON [`ErrorResponse`] with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inkwell_core::AppError;
use inkwell_worker::UploadError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Newtype so `IntoResponse` can be implemented for the core error.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<UploadError> for HttpAppError {
    fn from(err: UploadError) -> Self {
        HttpAppError(err.into())
    }
}

fn log_error(status: StatusCode, error: &AppError) {
    if status.is_server_error() {
        tracing::error!(error = %error, code = error.error_code(), "Request failed");
    } else {
        tracing::debug!(error = %error, code = error.error_code(), "Request rejected");
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(status, app_error);

        // Sensitive errors never carry details; the rest only outside production.
        let details = if is_production_env() || app_error.is_sensitive() {
            None
        } else {
            Some(format!("{:?}", app_error))
        };

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            details,
            code: app_error.error_code().to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_errors_keep_their_status() {
        let too_large = inkwell_core::ValidationError::FileTooLarge { size: 20, max: 10 };
        let too_large: HttpAppError = UploadError::Validation(too_large).into();
        assert_eq!(
            too_large.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );

        let stopped: HttpAppError = UploadError::WorkerStopped.into();
        assert_eq!(
            stopped.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
