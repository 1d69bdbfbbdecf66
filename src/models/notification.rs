use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    Signup,
    Login,
    OrderPlaced,
    OrderStatusUpdated,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Signup => "Signup",
            NotificationType::Login => "Login",
            NotificationType::OrderPlaced => "OrderPlaced",
            NotificationType::OrderStatusUpdated => "OrderStatusUpdated",
        }
    }
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Signup" => Ok(NotificationType::Signup),
            "Login" => Ok(NotificationType::Login),
            "OrderPlaced" => Ok(NotificationType::OrderPlaced),
            "OrderStatusUpdated" => Ok(NotificationType::OrderStatusUpdated),
            other => Err(AppError::UnknownNotificationType(other.to_string())),
        }
    }
}

/// Built per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub notification_type: NotificationType,
    pub recipient_email: String,
    pub recipient_first_name: String,
}

impl NotificationEvent {
    pub fn new(
        notification_type: NotificationType,
        recipient_email: impl Into<String>,
        recipient_first_name: impl Into<String>,
    ) -> Self {
        Self {
            notification_type,
            recipient_email: recipient_email.into(),
            recipient_first_name: recipient_first_name.into(),
        }
    }

    pub fn topic_name(&self) -> String {
        Topic::name_for(&self.recipient_first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub identifier: String,
}

impl Topic {
    pub fn name_for(first_name: &str) -> String {
        format!("user-{}-actions", first_name)
    }

    /// Identifiers are `<namespace>:<name>`, so a name is recoverable by suffix.
    pub fn identifier_for(namespace: &str, name: &str) -> String {
        format!("{}:{}", namespace, name)
    }

    pub fn matches_name(identifier: &str, name: &str) -> bool {
        identifier.ends_with(&format!(":{}", name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: String,
    pub topic_identifier: String,
    pub protocol: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedNotification {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Start,
    ResolvingTopic,
    CreatingTopic,
    Subscribing,
    LookingUp,
    Enqueuing,
    Done,
    Failed,
}

impl Display for DispatchStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            DispatchStage::Start => "start",
            DispatchStage::ResolvingTopic => "resolving_topic",
            DispatchStage::CreatingTopic => "creating_topic",
            DispatchStage::Subscribing => "subscribing",
            DispatchStage::LookingUp => "looking_up",
            DispatchStage::Enqueuing => "enqueuing",
            DispatchStage::Done => "done",
            DispatchStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub topic_identifier: String,
    pub subscription_id: Option<String>,
    pub message_id: String,
    pub delay_seconds: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_known_types() {
        for kind in [
            NotificationType::Signup,
            NotificationType::Login,
            NotificationType::OrderPlaced,
            NotificationType::OrderStatusUpdated,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationType>().unwrap(), kind);
        }
    }

    #[test]
    fn rejects_unknown_type() {
        let err = "PasswordReset".parse::<NotificationType>().unwrap_err();
        assert!(matches!(err, AppError::UnknownNotificationType(t) if t == "PasswordReset"));
    }

    #[test]
    fn topic_name_and_identifier_line_up() {
        let event = NotificationEvent::new(NotificationType::Login, "a@x.com", "Ana");
        let name = event.topic_name();
        let identifier = Topic::identifier_for("arn:storefront:us-east-1:000000000000", &name);

        assert_eq!(name, "user-Ana-actions");
        assert!(Topic::matches_name(&identifier, &name));
        assert!(!Topic::matches_name(&identifier, "Ana-actions"));
    }
}
