use std::sync::Arc;

use anyhow::{Error, Result};
use chrono::{SecondsFormat, Utc};
use futures_util::StreamExt;
use tracing::{debug, error, info, warn};

use crate::{
    clients::rbmq::RabbitMqClient, models::message::DlqMessage,
    notifications::renderer::NotificationRenderer, utils::process_message,
};

/// Consumes the notification queue until the consumer stream ends.
///
/// Processed and skipped messages are acknowledged. Failed messages are
/// copied to the failed queue and rejected without requeue.
pub async fn run_worker(
    rabbitmq: Arc<RabbitMqClient>,
    renderer: NotificationRenderer,
) -> Result<(), Error> {
    let mut consumer = rabbitmq.create_consumer().await?;

    info!("Notification worker started");

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(e) => {
                error!(error = %e, "Failed to receive delivery");
                continue;
            }
        };

        let payload = String::from_utf8_lossy(&delivery.data).into_owned();

        match process_message(&payload, &renderer).await {
            Ok(outcome) => {
                debug!(outcome = %outcome, "Queued notification handled");
                rabbitmq.acknowledge(delivery.delivery_tag).await?;
            }
            Err(e) => {
                warn!(error = %e, "Queued notification failed, routing to failed queue");

                let dlq_message = DlqMessage {
                    original_payload: payload,
                    failure_reason: e.to_string(),
                    failed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                };

                if let Err(dlq_err) = rabbitmq.publish_to_dlq(&dlq_message).await {
                    error!(error = %dlq_err, "Failed to publish to failed queue, requeueing");
                    rabbitmq.reject(delivery.delivery_tag, true).await?;
                    continue;
                }

                rabbitmq.reject(delivery.delivery_tag, false).await?;
            }
        }
    }

    warn!("Notification consumer stream ended");
    Ok(())
}
