use std::sync::Arc;

use tracing::info;

use crate::{clients::TopicService, error::AppError};

pub const EMAIL_PROTOCOL: &str = "email";

#[derive(Clone)]
pub struct SubscriptionManager {
    topics: Arc<dyn TopicService>,
}

impl SubscriptionManager {
    pub fn new(topics: Arc<dyn TopicService>) -> Self {
        Self { topics }
    }

    /// Deliveries start once the endpoint owner confirms out of band; this
    /// call does not wait for that.
    pub async fn subscribe(&self, topic_identifier: &str, endpoint: &str) -> Result<String, AppError> {
        let subscription_id = self
            .topics
            .subscribe(topic_identifier, EMAIL_PROTOCOL, endpoint)
            .await?;

        info!(
            topic_identifier,
            endpoint,
            subscription_id = %subscription_id,
            "Endpoint subscribed"
        );
        Ok(subscription_id)
    }
}
