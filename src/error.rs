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
    /// A model artifact is missing or structurally invalid; fatal at startup
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Loaded models and assembled features disagree; an internal defect,
    /// never a request problem
    #[error("Model consistency error: {0}")]
    ModelConsistency(String),

    /// Request shape errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A supplied measurement value cannot be converted to a number
    #[error("Field '{field}' is not numeric: {value}")]
    TypeCoercion { field: String, value: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Upstream assistant (LLM) errors
    #[error("Assistant error: {0}")]
    Assistant(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::TypeCoercion { .. } => StatusCode::BAD_REQUEST,
            AppError::Assistant(_) => StatusCode::BAD_GATEWAY,
            AppError::ModelLoad(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ModelConsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::TypeCoercion { .. } => "TYPE_COERCION_ERROR",
            AppError::Assistant(_) => "ASSISTANT_ERROR",
            AppError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            AppError::ModelConsistency(_) => "MODEL_CONSISTENCY_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            // Consistency and load errors indicate a defect in the deployed
            // model set and need operator attention.
            tracing::error!(
                error_code = error_code,
                status_code = status.as_u16(),
                message = %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = status.as_u16(),
                message = %message,
                "Request rejected"
            );
        }

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
