use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Schema/type violation in a request batch
    #[error("Invalid model input at record {position}, field '{field}': {message}")]
    ModelInput {
        position: usize,
        field: String,
        message: String,
    },

    /// Evaluation requested without ground truth
    #[error("Missing label: {0}")]
    MissingLabel(String),

    /// Model/feature-space introspection failure
    #[error("Explainability error: {0}")]
    Explainability(String),

    /// Record-source network/auth failure
    #[error("Upstream fetch error: {0}")]
    UpstreamFetch(String),

    /// Record-source credential absent or rejected
    #[error("Upstream authorization error: {0}")]
    UpstreamAuth(String),

    /// Configuration errors (including model artifact problems)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Validation errors on request DTOs
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid queue state transition
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ModelInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingLabel(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Explainability(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamAuth(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidStateTransition(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::ModelInput { .. } => "MODEL_INPUT_ERROR",
            AppError::MissingLabel(_) => "MISSING_LABEL_ERROR",
            AppError::Explainability(_) => "EXPLAINABILITY_ERROR",
            AppError::UpstreamFetch(_) => "UPSTREAM_FETCH_ERROR",
            AppError::UpstreamAuth(_) => "UPSTREAM_AUTH_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert AppError to HTTP response
///
/// Used by the queue endpoints; the legacy endpoints flatten errors into the
/// always-200 `{error, trace}` body instead (see `api::handlers::LegacyResult`).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        tracing::error!(
            error_code = error_code,
            status_code = status.as_u16(),
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
