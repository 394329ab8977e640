//! Error types for ledgerflow-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ledgerflow_core::{CoreError, DefaultErrorLogger, ErrorContext, ErrorLogger};
use ledgerflow_export::ExportError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => {
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for the `error` field
    pub fn code(&self) -> String {
        match self {
            ApiError::Core(e) => e.code().to_string(),
            ApiError::Export(_) => "EXPORT_ERROR".to_string(),
        }
    }

    /// Log through the shared error logger, then hand the error back
    pub fn logged(self, context: &ErrorContext) -> Self {
        match &self {
            ApiError::Core(e) => DefaultErrorLogger.log_error(e, context),
            ApiError::Export(e) => log::error!(
                target: "ledgerflow::error",
                "{} - Operation: {} - User: {:?}",
                e,
                context.operation,
                context.user_id
            ),
        }
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(CoreError::missing("user_id")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(CoreError::Unauthorized { message: "mismatch".into() }).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(CoreError::NotFound { token: "t".into() }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ExportError::Pdf { message: "font".into() }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::from(CoreError::InvalidField { value: "x".into() }).code(), "INVALID_FIELD");
        assert_eq!(
            ApiError::from(ExportError::Spreadsheet { message: "io".into() }).code(),
            "EXPORT_ERROR"
        );
    }
}
