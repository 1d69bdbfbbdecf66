use std::sync::Arc;

use tracing::{debug, info};

use crate::{clients::TopicService, error::AppError, models::notification::Topic};

/// Resolves topic names to identifiers.
#[derive(Clone)]
pub struct TopicDirectory {
    topics: Arc<dyn TopicService>,
}

impl TopicDirectory {
    pub fn new(topics: Arc<dyn TopicService>) -> Self {
        Self { topics }
    }

    /// Creation is upsert-by-name: a repeated call returns the same identifier.
    pub async fn create_topic(&self, name: &str) -> Result<String, AppError> {
        let identifier = self.topics.create_topic(name).await?;

        info!(topic = name, topic_identifier = %identifier, "Topic ready");
        Ok(identifier)
    }

    /// Lists every topic and returns the one whose identifier ends with `:<name>`.
    pub async fn resolve_topic(&self, name: &str) -> Result<Option<String>, AppError> {
        let topics = self.topics.list_topics().await?;
        let scanned = topics.len();

        let found = topics
            .into_iter()
            .map(|topic| topic.identifier)
            .find(|identifier| Topic::matches_name(identifier, name));

        debug!(topic = name, scanned, found = found.is_some(), "Topic lookup finished");
        Ok(found)
    }
}
