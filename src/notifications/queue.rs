use std::sync::Arc;

use tracing::info;

use crate::{
    clients::QueueService,
    error::AppError,
    models::{
        message::MessageAttributes,
        notification::{NotificationEvent, NotificationType},
    },
};

#[derive(Clone)]
pub struct DeliveryQueueClient {
    queue: Arc<dyn QueueService>,
    signup_delay_seconds: u32,
}

impl DeliveryQueueClient {
    pub fn new(queue: Arc<dyn QueueService>, signup_delay_seconds: u32) -> Self {
        Self {
            queue,
            signup_delay_seconds,
        }
    }

    /// Signup deliveries are held back so the new subscription can be
    /// confirmed before the first message is published.
    pub fn delay_for(&self, notification_type: NotificationType) -> u32 {
        match notification_type {
            NotificationType::Signup => self.signup_delay_seconds,
            _ => 0,
        }
    }

    pub async fn enqueue(
        &self,
        event: &NotificationEvent,
        topic_identifier: &str,
    ) -> Result<String, AppError> {
        let attributes = MessageAttributes {
            customer_first_name: event.recipient_first_name.clone(),
            customer_email: event.recipient_email.clone(),
            notification_type: event.notification_type.to_string(),
            topic_arn: topic_identifier.to_string(),
        };
        let body = format!("Notification for {}", event.recipient_first_name);
        let delay_seconds = self.delay_for(event.notification_type);

        let message_id = self
            .queue
            .send_message(&body, &attributes, delay_seconds)
            .await?;

        info!(
            message_id = %message_id,
            notification_type = %event.notification_type,
            delay_seconds,
            "Notification queued for delivery"
        );
        Ok(message_id)
    }
}
