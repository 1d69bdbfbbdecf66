//! Collaborator services the handlers and the notification pipeline talk to.
//!
//! Each collaborator is a trait so the Redis, RabbitMQ, S3 and e-mail gateway
//! backends can be swapped for in-process ones behind an `Arc<dyn …>`.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        item::{FieldDiff, IndexQuery, Item, ScanFilter},
        message::MessageAttributes,
        notification::Topic,
    },
};

pub mod circuit_breaker;
pub mod email;
pub mod health;
pub mod objects;
pub mod rbmq;
pub mod store;
pub mod topics;

/// Key-value table access. Items are JSON objects keyed by `id`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, AppError>;

    /// Inserts or replaces the item stored under its `id`.
    async fn put(&self, table: &str, item: Item) -> Result<(), AppError>;

    /// Applies `diff` to an existing item and returns the updated item, or
    /// `None` when no item exists under `id`.
    async fn update(&self, table: &str, id: &str, diff: &FieldDiff)
    -> Result<Option<Item>, AppError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), AppError>;

    async fn scan(&self, table: &str, filter: Option<&ScanFilter>) -> Result<Vec<Item>, AppError>;

    async fn query(&self, table: &str, query: &IndexQuery) -> Result<Vec<Item>, AppError>;
}

/// Named fan-out channels with e-mail subscribers.
#[async_trait]
pub trait TopicService: Send + Sync {
    /// Creates the topic, or returns the existing identifier for `name`.
    async fn create_topic(&self, name: &str) -> Result<String, AppError>;

    /// Returns every topic in a single page.
    async fn list_topics(&self) -> Result<Vec<Topic>, AppError>;

    async fn subscribe(
        &self,
        topic_identifier: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<String, AppError>;

    /// Delivers `subject`/`body` to every current subscriber of the topic.
    async fn publish(
        &self,
        topic_identifier: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, AppError>;
}

#[async_trait]
pub trait QueueService: Send + Sync {
    async fn send_message(
        &self,
        body: &str,
        attributes: &MessageAttributes,
        delay_seconds: u32,
    ) -> Result<String, AppError>;
}

/// Blob storage for uploaded files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key` and returns the URL the object is served from.
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, AppError>;
}
