use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    clients::{QueueService, TopicService},
    error::AppError,
    models::{
        notification::{DispatchReceipt, DispatchStage, NotificationEvent, NotificationType},
        validation::validate_topic_name,
    },
    notifications::{
        directory::TopicDirectory, queue::DeliveryQueueClient,
        subscriptions::SubscriptionManager,
    },
};

/// Runs one dispatch:
///
/// ```text
/// Start -> ResolvingTopic -> CreatingTopic -> Subscribing -> Enqueuing -> Done   (Signup)
///                         -> LookingUp ---------------------> Enqueuing -> Done   (others)
/// ```
///
/// Any failing step moves to `Failed` and aborts the rest. Nothing already
/// done is rolled back.
#[derive(Clone)]
pub struct NotificationDispatcher {
    directory: TopicDirectory,
    subscriptions: SubscriptionManager,
    queue: DeliveryQueueClient,
}

impl NotificationDispatcher {
    pub fn new(
        topics: Arc<dyn TopicService>,
        queue: Arc<dyn QueueService>,
        signup_delay_seconds: u32,
    ) -> Self {
        Self {
            directory: TopicDirectory::new(Arc::clone(&topics)),
            subscriptions: SubscriptionManager::new(topics),
            queue: DeliveryQueueClient::new(queue, signup_delay_seconds),
        }
    }

    pub async fn dispatch(&self, event: &NotificationEvent) -> Result<DispatchReceipt, AppError> {
        let mut stage = DispatchStage::Start;
        let result = self.run(event, &mut stage).await;

        match &result {
            Ok(receipt) => info!(
                notification_type = %event.notification_type,
                topic_identifier = %receipt.topic_identifier,
                message_id = %receipt.message_id,
                delay_seconds = receipt.delay_seconds,
                "Notification dispatched"
            ),
            Err(e) => {
                let failed_at = stage;
                advance(&mut stage, DispatchStage::Failed);
                warn!(
                    notification_type = %event.notification_type,
                    stage = %failed_at,
                    error = %e,
                    "Notification dispatch failed"
                );
            }
        }

        result
    }

    async fn run(
        &self,
        event: &NotificationEvent,
        stage: &mut DispatchStage,
    ) -> Result<DispatchReceipt, AppError> {
        if event.recipient_email.trim().is_empty() {
            return Err(AppError::Validation(
                "Recipient email is required for notifications".to_string(),
            ));
        }

        let topic_name = event.topic_name();
        validate_topic_name(&topic_name)?;

        advance(stage, DispatchStage::ResolvingTopic);

        let (topic_identifier, subscription_id) = match event.notification_type {
            NotificationType::Signup => {
                advance(stage, DispatchStage::CreatingTopic);
                let identifier = self.directory.create_topic(&topic_name).await?;

                advance(stage, DispatchStage::Subscribing);
                let subscription_id = self
                    .subscriptions
                    .subscribe(&identifier, &event.recipient_email)
                    .await?;

                (identifier, Some(subscription_id))
            }
            NotificationType::Login
            | NotificationType::OrderPlaced
            | NotificationType::OrderStatusUpdated => {
                advance(stage, DispatchStage::LookingUp);
                let identifier = self
                    .directory
                    .resolve_topic(&topic_name)
                    .await?
                    .ok_or_else(|| AppError::TopicNotProvisioned(topic_name.clone()))?;

                (identifier, None)
            }
        };

        advance(stage, DispatchStage::Enqueuing);
        let message_id = self.queue.enqueue(event, &topic_identifier).await?;

        advance(stage, DispatchStage::Done);

        Ok(DispatchReceipt {
            delay_seconds: self.queue.delay_for(event.notification_type),
            topic_identifier,
            subscription_id,
            message_id,
        })
    }
}

fn advance(stage: &mut DispatchStage, next: DispatchStage) {
    debug!(from = %stage, to = %next, "Dispatch stage");
    *stage = next;
}
