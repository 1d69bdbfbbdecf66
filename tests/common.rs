use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value as JsonValue;
use storefront_service::{
    api::{AppState, router},
    clients::{QueueService, TopicService},
    config::{TableNames, default_signup_delay_seconds},
    models::retry::RetryConfig,
    notifications::{dispatcher::NotificationDispatcher, renderer::NotificationRenderer},
};
use tower::ServiceExt;

use crate::memory::{CallLog, MemoryObjectStore, MemoryQueue, MemoryStore, MemoryTopicService};

pub const NAMESPACE: &str = "topic-123";

/// In-process collaborators sharing one call log.
pub struct Harness {
    pub log: CallLog,
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub topics: Arc<MemoryTopicService>,
    pub queue: Arc<MemoryQueue>,
}

impl Harness {
    pub fn new() -> Self {
        let log = CallLog::new();

        Self {
            store: Arc::new(MemoryStore::new()),
            objects: Arc::new(MemoryObjectStore::new()),
            topics: Arc::new(MemoryTopicService::new(log.clone()).with_namespace(NAMESPACE)),
            queue: Arc::new(MemoryQueue::new(log.clone())),
            log,
        }
    }

    pub fn dispatcher(&self) -> NotificationDispatcher {
        let topics: Arc<dyn TopicService> = self.topics.clone();
        let queue: Arc<dyn QueueService> = self.queue.clone();

        NotificationDispatcher::new(topics, queue, default_signup_delay_seconds())
    }

    pub fn renderer(&self) -> NotificationRenderer {
        let topics: Arc<dyn TopicService> = self.topics.clone();

        NotificationRenderer::new(topics)
    }

    pub fn app(&self, notification_failure_fatal: bool) -> Router {
        self.app_with_state(|state| state.with_fatal_notifications(notification_failure_fatal))
    }

    pub fn app_with_state(&self, configure: impl FnOnce(AppState) -> AppState) -> Router {
        let state = AppState::new(
            self.store.clone(),
            self.objects.clone(),
            self.dispatcher(),
            TableNames::default(),
        );

        router(Arc::new(configure(state)))
    }
}

pub fn fast_retry_config(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay_ms: 10,
        max_delay_ms: 50,
        backoff_multiplier: 2,
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    respond(app, request).await
}

pub const BOUNDARY: &str = "storefront-boundary";

/// One `multipart/form-data` part: field name, optional file name, content type, bytes.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, file_name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn send_multipart(
    app: &Router,
    uri: &str,
    content_type: &str,
    body: Vec<u8>,
) -> (StatusCode, JsonValue) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();

    respond(app, request).await
}

async fn respond(app: &Router, request: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}
