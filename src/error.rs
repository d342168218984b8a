use axum::{
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
    Json,
};
use thiserror::Error;

/// Outward-facing error taxonomy. Every variant carries a stable code and a
/// message safe to show to the client (no absolute paths, no stack traces).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Access denied")]
    AccessDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Shared item is no longer available")]
    TargetGone,

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Destination is not a directory")]
    InvalidDestination,

    #[error("Item '{0}' already exists in destination")]
    AlreadyExists(String),

    #[error("Cannot move '{0}' into itself")]
    SelfContainment(String),

    #[error("Unknown share link")]
    LinkInvalid,

    #[error("Failed to persist metadata: {0}")]
    Persistence(#[source] std::io::Error),

    #[error("Operation failed")]
    Internal(#[source] std::io::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::AccessDenied => "ACCESS_DENIED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::TargetGone => "TARGET_GONE",
            ApiError::NotADirectory(_) => "NOT_A_DIRECTORY",
            ApiError::InvalidDestination => "INVALID_DESTINATION",
            ApiError::AlreadyExists(_) => "ALREADY_EXISTS",
            ApiError::SelfContainment(_) => "SELF_CONTAINMENT",
            ApiError::LinkInvalid => "LINK_INVALID",
            ApiError::Persistence(_) => "PERSISTENCE_ERROR",
            ApiError::Internal(_) => "OPERATION_FAILED",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::AccessDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::TargetGone | ApiError::LinkInvalid => {
                StatusCode::NOT_FOUND
            }
            ApiError::NotADirectory(_)
            | ApiError::InvalidDestination
            | ApiError::AlreadyExists(_)
            | ApiError::SelfContainment(_) => StatusCode::BAD_REQUEST,
            ApiError::Persistence(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> AxumResponse {
        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound("requested item does not exist".to_string())
        } else {
            ApiError::Internal(err)
        }
    }
}
