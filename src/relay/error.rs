use crate::types::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Prompt is required")]
    PromptRequired,

    #[error("API key not configured")]
    ApiKeyMissing,

    #[error("Request timeout - AI API took too long to respond")]
    ChatTimeout,

    #[error("API request failed: {status} {body}")]
    ChatUpstream { status: u16, body: String },

    #[error("{source}")]
    ChatRequestFailed { source: reqwest::Error },

    #[error("Failed to fetch models: {status}")]
    ModelsUpstream { status: u16 },

    #[error("{source}")]
    ModelsRequestFailed { source: reqwest::Error },

    #[error("Request timeout - Image generation took too long")]
    ImageTimeout,

    #[error("Invalid response: Expected image data")]
    NotAnImage,

    #[error("{source}")]
    ImageRequestFailed { source: reqwest::Error },

    #[error("{source}")]
    InvalidBody {
        #[from]
        source: serde_json::Error,
    },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl RelayError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::PromptRequired => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The JSON body clients see. The outer `error` label depends on
    /// which endpoint the failure belongs to; the `message` carries the
    /// diagnostic detail, raw upstream text included.
    pub fn error_response(&self) -> ErrorResponse {
        match self {
            RelayError::MethodNotAllowed => ErrorResponse::new("Method not allowed"),
            RelayError::PromptRequired => ErrorResponse::new("Prompt is required"),
            RelayError::ApiKeyMissing => ErrorResponse::new("API key not configured"),
            RelayError::ModelsUpstream { .. } | RelayError::ModelsRequestFailed { .. } => {
                ErrorResponse::with_message("Failed to fetch models", self.to_string())
            }
            RelayError::Internal { message } => {
                ErrorResponse::with_message("Internal server error", message.clone())
            }
            _ => ErrorResponse::with_message("Internal server error", self.to_string()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::error!("Relay error: {} (status: {})", self, status);

        (status, Json(self.error_response())).into_response()
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RelayError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            RelayError::PromptRequired.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::ApiKeyMissing.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::ChatTimeout.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::ModelsUpstream { status: 500 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_specific_bodies_have_no_message() {
        for error in [
            RelayError::MethodNotAllowed,
            RelayError::PromptRequired,
            RelayError::ApiKeyMissing,
        ] {
            let body = error.error_response();
            assert!(body.message.is_none(), "{:?} should carry no message", body);
        }
    }

    #[test]
    fn test_chat_upstream_body() {
        let error = RelayError::ChatUpstream {
            status: 503,
            body: "service unavailable".to_string(),
        };
        let body = error.error_response();
        assert_eq!(body.error, "Internal server error");
        assert_eq!(
            body.message.as_deref(),
            Some("API request failed: 503 service unavailable")
        );
    }

    #[test]
    fn test_models_upstream_body() {
        let error = RelayError::ModelsUpstream { status: 500 };
        let body = error.error_response();
        assert_eq!(body.error, "Failed to fetch models");
        assert_eq!(body.message.as_deref(), Some("Failed to fetch models: 500"));
    }

    #[test]
    fn test_timeout_messages() {
        let body = RelayError::ChatTimeout.error_response();
        assert_eq!(
            body.message.as_deref(),
            Some("Request timeout - AI API took too long to respond")
        );

        let body = RelayError::ImageTimeout.error_response();
        assert_eq!(
            body.message.as_deref(),
            Some("Request timeout - Image generation took too long")
        );
    }
}
