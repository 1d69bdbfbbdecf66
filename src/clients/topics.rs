use std::collections::HashMap;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    clients::{TopicService, email::EmailClient},
    config::Config,
    error::AppError,
    models::{
        notification::{Subscription, Topic},
        validation::validate_topic_name,
    },
};

const TOPICS_KEY: &str = "topics";

/// Topic directory kept in Redis, delivering to subscribers by e-mail.
///
/// `topics` maps topic name to identifier; `topic:<identifier>:subscriptions`
/// maps endpoint to the serialized [`Subscription`].
pub struct RedisTopicService {
    connection: MultiplexedConnection,
    namespace: String,
    email_client: EmailClient,
}

impl RedisTopicService {
    pub async fn connect(config: &Config, email_client: EmailClient) -> Result<Self, Error> {
        info!("Connecting to Redis topic directory");

        let client = Client::open(config.redis_url.as_str())
            .map_err(|_| anyhow!("Failed to create redis client"))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|_| anyhow!("Failed to connect to redis client"))?;

        Ok(Self::new(
            connection,
            config.topic_namespace.clone(),
            email_client,
        ))
    }

    pub fn new(connection: MultiplexedConnection, namespace: String, email_client: EmailClient) -> Self {
        Self {
            connection,
            namespace,
            email_client,
        }
    }

    fn subscriptions_key(topic_identifier: &str) -> String {
        format!("topic:{}:subscriptions", topic_identifier)
    }

    async fn ensure_topic_exists(&self, topic_identifier: &str) -> Result<(), AppError> {
        let prefix = format!("{}:", self.namespace);
        let name = topic_identifier
            .strip_prefix(&prefix)
            .ok_or_else(|| AppError::NotFound(format!("Topic {} does not exist", topic_identifier)))?;

        let mut conn = self.connection.clone();
        let stored: Option<String> = conn.hget(TOPICS_KEY, name).await?;

        match stored {
            Some(identifier) if identifier == topic_identifier => Ok(()),
            _ => Err(AppError::NotFound(format!(
                "Topic {} does not exist",
                topic_identifier
            ))),
        }
    }

    async fn subscriptions(&self, topic_identifier: &str) -> Result<Vec<Subscription>, AppError> {
        let mut conn = self.connection.clone();
        let values: Vec<String> = conn.hvals(Self::subscriptions_key(topic_identifier)).await?;

        values
            .iter()
            .map(|raw| serde_json::from_str::<Subscription>(raw).map_err(AppError::from))
            .collect()
    }
}

#[async_trait]
impl TopicService for RedisTopicService {
    async fn create_topic(&self, name: &str) -> Result<String, AppError> {
        validate_topic_name(name)?;

        let identifier = Topic::identifier_for(&self.namespace, name);
        let mut conn = self.connection.clone();

        // HSETNX makes creation an upsert-by-name, so racing signups share one topic.
        let created: bool = conn.hset_nx(TOPICS_KEY, name, &identifier).await?;
        let stored: Option<String> = conn.hget(TOPICS_KEY, name).await?;

        if created {
            info!(topic = name, topic_identifier = %identifier, "Created topic");
        } else {
            debug!(topic = name, "Topic already exists");
        }

        Ok(stored.unwrap_or(identifier))
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, AppError> {
        let mut conn = self.connection.clone();
        let entries: HashMap<String, String> = conn.hgetall(TOPICS_KEY).await?;

        Ok(entries
            .into_iter()
            .map(|(name, identifier)| Topic { name, identifier })
            .collect())
    }

    async fn subscribe(
        &self,
        topic_identifier: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<String, AppError> {
        self.ensure_topic_exists(topic_identifier).await?;

        let key = Self::subscriptions_key(topic_identifier);
        let subscription = Subscription {
            subscription_id: format!("{}:{}", topic_identifier, Uuid::new_v4()),
            topic_identifier: topic_identifier.to_string(),
            protocol: protocol.to_string(),
            endpoint: endpoint.to_string(),
        };

        let mut conn = self.connection.clone();
        let created: bool = conn
            .hset_nx(&key, endpoint, serde_json::to_string(&subscription)?)
            .await?;

        if !created {
            let raw: Option<String> = conn.hget(&key, endpoint).await?;
            if let Some(existing) = raw {
                let existing = serde_json::from_str::<Subscription>(&existing)?;
                debug!(topic_identifier, endpoint, "Endpoint already subscribed");
                return Ok(existing.subscription_id);
            }
        }

        info!(
            topic_identifier,
            endpoint,
            subscription_id = %subscription.subscription_id,
            "Subscribed endpoint to topic"
        );
        Ok(subscription.subscription_id)
    }

    async fn publish(
        &self,
        topic_identifier: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, AppError> {
        self.ensure_topic_exists(topic_identifier).await?;

        let subscriptions = self.subscriptions(topic_identifier).await?;
        let publish_id = Uuid::new_v4().to_string();
        let mut delivered = 0usize;
        let mut failed = 0usize;

        for subscription in &subscriptions {
            if subscription.protocol != "email" {
                warn!(
                    protocol = %subscription.protocol,
                    endpoint = %subscription.endpoint,
                    "Skipping subscription with unsupported protocol"
                );
                continue;
            }

            match self
                .email_client
                .send_email(&subscription.endpoint, subject, body)
                .await
            {
                Ok(_) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        endpoint = %subscription.endpoint,
                        error = %e,
                        "E-mail delivery failed"
                    );
                }
            }
        }

        if delivered == 0 && failed > 0 {
            return Err(AppError::TransientService(format!(
                "all {} deliveries failed for {}",
                failed, topic_identifier
            )));
        }

        info!(
            topic_identifier,
            publish_id = %publish_id,
            delivered,
            failed,
            "Published notification to topic"
        );
        Ok(publish_id)
    }
}
