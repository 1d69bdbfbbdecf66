use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Uniform `{status, code, message, data, meta}` wrapper returned by every handler.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub status: ResponseStatus,
    pub code: u16,
    pub message: String,
    pub data: T,
    pub meta: Meta,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> Envelope<T> {
    pub fn success(code: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            code: code.as_u16(),
            message: message.into(),
            data,
            meta: Meta::default(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.meta.count = Some(count);
        self
    }
}

impl Envelope<JsonValue> {
    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            code: code.as_u16(),
            message: message.into(),
            data: serde_json::json!({}),
            meta: Meta::default(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}
