use crate::whisper::transport::TransportError;
use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt whisper record: {0}")]
    CorruptRecord(String),

    #[error("Invalid webhook token")]
    InvalidWebhookToken,
}

impl AppError {
    pub fn corrupt_record<S: Into<String>>(msg: S) -> Self {
        Self::CorruptRecord(msg.into())
    }

    /// Whether this error comes from the whisper storage layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Database(_) | Self::CorruptRecord(_))
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convert AppError to HTTP status codes for web responses
impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::CorruptRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidWebhookToken => StatusCode::FORBIDDEN,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_storage_errors_are_distinct_from_other_failures() {
        assert!(AppError::Database(sqlx::Error::PoolTimedOut).is_storage());
        assert!(AppError::corrupt_record("half-opened").is_storage());
        assert!(!AppError::Transport(TransportError::Timeout).is_storage());
        assert!(!AppError::InvalidWebhookToken.is_storage());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidWebhookToken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Transport(TransportError::Timeout).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
