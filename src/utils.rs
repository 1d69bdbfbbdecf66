use anyhow::{Error, Result, anyhow};
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::{message::QueuedMessage, retry::RetryConfig, status::ProcessOutcome},
    notifications::renderer::NotificationRenderer,
};

/// Renders one queued notification intent and publishes it to its topic.
///
/// Unknown notification types are logged and skipped so the message is
/// acknowledged; malformed payloads and publish failures are errors.
pub async fn process_message(
    payload: &str,
    renderer: &NotificationRenderer,
) -> Result<ProcessOutcome, Error> {
    let message = serde_json::from_str::<QueuedMessage>(payload)
        .map_err(|e| anyhow!("Malformed queued notification: {}", e))?;
    let attributes = &message.attributes;

    info!(
        message_id = %message.message_id,
        notification_type = %attributes.notification_type,
        topic_identifier = %attributes.topic_arn,
        "Processing queued notification"
    );

    let rendered = match NotificationRenderer::render(
        &attributes.notification_type,
        &attributes.customer_first_name,
    ) {
        Ok(rendered) => rendered,
        Err(AppError::UnknownNotificationType(kind)) => {
            warn!(
                message_id = %message.message_id,
                notification_type = %kind,
                "Unknown notification type, skipping"
            );
            return Ok(ProcessOutcome::Skipped {
                reason: format!("Unknown notification type: {}", kind),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let publish_id = renderer
        .publish(&attributes.topic_arn, &rendered)
        .await
        .map_err(|e| anyhow!("Publishing to {} failed: {}", attributes.topic_arn, e))?;

    info!(
        message_id = %message.message_id,
        publish_id = %publish_id,
        "Notification published"
    );

    Ok(ProcessOutcome::Published { publish_id })
}

pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        attempt,
                        max_attempts = config.max_attempts,
                        "Retry succeeded"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    warn!(
                        max_attempts = config.max_attempts,
                        error = %e,
                        "Retry failed after exhausting all attempts"
                    );
                    return Err(e);
                }

                debug!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms,
                    "Retry attempt failed, backing off"
                );

                let jitter = rand::random_range(-0.1..=0.1);

                let jittered_delay = (delay_ms as f64 * (1.0 + jitter)) as u64;

                sleep(Duration::from_millis(jittered_delay)).await;

                delay_ms = std::cmp::min(delay_ms * config.backoff_multiplier, config.max_delay_ms);
            }
        }
    }
}
