use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Transport-level failure talking to a provider (connectivity, timeouts)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status or a body we could not parse
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for the two lookup failures the picker swallows
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Provider(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Provider(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Network(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
