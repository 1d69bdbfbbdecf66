use std::sync::Arc;

use tracing::debug;

use crate::{
    clients::TopicService,
    error::AppError,
    models::notification::{NotificationType, RenderedNotification},
};

#[derive(Clone)]
pub struct NotificationRenderer {
    topics: Arc<dyn TopicService>,
}

impl NotificationRenderer {
    pub fn new(topics: Arc<dyn TopicService>) -> Self {
        Self { topics }
    }

    /// Fails with [`AppError::UnknownNotificationType`] for unrecognised types.
    pub fn render(notification_type: &str, first_name: &str) -> Result<RenderedNotification, AppError> {
        let kind = notification_type.parse::<NotificationType>()?;
        Ok(Self::render_kind(kind, first_name))
    }

    pub fn render_kind(kind: NotificationType, first_name: &str) -> RenderedNotification {
        let (subject, body) = match kind {
            NotificationType::Signup => (
                "Welcome to Our Service",
                format!("Thank you for signing up, {}!", first_name),
            ),
            NotificationType::Login => (
                "Login Alert",
                "You have successfully logged in!".to_string(),
            ),
            NotificationType::OrderPlaced => (
                "Order Confirmation",
                "Your order has been placed!".to_string(),
            ),
            NotificationType::OrderStatusUpdated => (
                "Order Status Updated",
                "Your order status has been updated!".to_string(),
            ),
        };

        RenderedNotification {
            subject: subject.to_string(),
            body,
        }
    }

    pub async fn publish(
        &self,
        topic_identifier: &str,
        rendered: &RenderedNotification,
    ) -> Result<String, AppError> {
        debug!(topic_identifier, subject = %rendered.subject, "Publishing rendered notification");

        self.topics
            .publish(topic_identifier, &rendered.subject, &rendered.body)
            .await
    }
}
