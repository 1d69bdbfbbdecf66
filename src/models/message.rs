use serde::{Deserialize, Serialize};

/// Attribute names are the wire names the delivery worker reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageAttributes {
    pub customer_first_name: String,
    pub customer_email: String,
    pub notification_type: String,
    pub topic_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub message_id: String,
    pub attributes: MessageAttributes,
    pub body: String,
    pub delay_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqMessage {
    pub original_payload: String,
    pub failure_reason: String,
    pub failed_at: String,
}
