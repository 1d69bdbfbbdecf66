use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::response::Envelope;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Unknown notification type: {0}")]
    UnknownNotificationType(String),

    /// Non-signup events assume a prior signup created the topic.
    #[error("Topic '{0}' has not been provisioned")]
    TopicNotProvisioned(String),

    #[error("Service unavailable: {0}")]
    TransientService(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnknownNotificationType(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::TransientService(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::TopicNotProvisioned(_) | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to echo back to a client. Server-side failures never
    /// expose their internal detail.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::PayloadTooLarge(_)
            | AppError::UnknownNotificationType(_) => self.to_string(),
            AppError::TopicNotProvisioned(_) => "Notification could not be delivered".to_string(),
            AppError::TransientService(_) => "Service temporarily unavailable".to_string(),
            AppError::Serialization(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::TransientService(_))
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::TransientService(format!("redis: {}", err))
    }
}

impl From<lapin::Error> for AppError {
    fn from(err: lapin::Error) -> Self {
        AppError::TransientService(format!("rabbitmq: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        }

        Envelope::error(status, self.public_message()).into_response()
    }
}
