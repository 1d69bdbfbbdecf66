use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
        BasicRejectOptions, QueueDeclareOptions,
    },
    types::{AMQPValue, FieldTable},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    clients::QueueService,
    config::Config,
    error::AppError,
    models::message::{DlqMessage, MessageAttributes, QueuedMessage},
};

/// Delayed messages wait in `<queue>.delay` until their per-message TTL
/// expires, then dead-letter into the notification queue.
pub struct RabbitMqClient {
    channel: Channel,
    queue_name: String,
    delay_queue_name: String,
    failed_queue_name: String,
}

impl RabbitMqClient {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        info!("Connecting to RabbitMQ");

        let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|_| anyhow!("Failed to connect to RabbitMQ"))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|_| anyhow!("RabbitMQ channel creation failed"))?;

        channel
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|_| anyhow!("Failed to set up QoS"))?;

        channel
            .queue_declare(
                &config.notification_queue_name,
                durable(),
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to declare notification queue"))?;

        let mut delay_arguments = FieldTable::default();
        delay_arguments.insert(
            "x-dead-letter-exchange".into(),
            AMQPValue::LongString("".into()),
        );
        delay_arguments.insert(
            "x-dead-letter-routing-key".into(),
            AMQPValue::LongString(config.notification_queue_name.as_str().into()),
        );

        channel
            .queue_declare(&config.delay_queue_name(), durable(), delay_arguments)
            .await
            .map_err(|_| anyhow!("Failed to declare delay queue"))?;

        channel
            .queue_declare(&config.failed_queue_name, durable(), FieldTable::default())
            .await
            .map_err(|_| anyhow!("Failed to declare failed queue"))?;

        info!(
            queue = %config.notification_queue_name,
            failed_queue = %config.failed_queue_name,
            "RabbitMQ queues declared"
        );

        Ok(Self {
            channel,
            queue_name: config.notification_queue_name.clone(),
            delay_queue_name: config.delay_queue_name(),
            failed_queue_name: config.failed_queue_name.clone(),
        })
    }

    pub async fn create_consumer(&self) -> Result<Consumer, Error> {
        let consumer = self
            .channel
            .basic_consume(
                &self.queue_name,
                "notification_worker",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to create consumer"))?;

        info!(queue = %self.queue_name, "Consumer created for queue");

        Ok(consumer)
    }

    pub async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(|_| anyhow!("Failed to acknowledge message"))?;

        Ok(())
    }

    pub async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), Error> {
        self.channel
            .basic_reject(delivery_tag, BasicRejectOptions { requeue })
            .await
            .map_err(|_| anyhow!("Failed to reject message"))?;

        Ok(())
    }

    pub async fn publish_to_dlq(&self, message: &DlqMessage) -> Result<(), Error> {
        let payload = serde_json::to_vec(message)?;

        self.channel
            .basic_publish(
                "",
                &self.failed_queue_name,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|_| anyhow!("Failed to publish message to dlq"))?;

        Ok(())
    }
}

fn durable() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        ..Default::default()
    }
}

#[async_trait]
impl QueueService for RabbitMqClient {
    async fn send_message(
        &self,
        body: &str,
        attributes: &MessageAttributes,
        delay_seconds: u32,
    ) -> Result<String, AppError> {
        let message = QueuedMessage {
            message_id: Uuid::new_v4().to_string(),
            attributes: attributes.clone(),
            body: body.to_string(),
            delay_seconds,
        };
        let payload = serde_json::to_vec(&message)?;

        let mut properties = BasicProperties::default()
            .with_delivery_mode(2)
            .with_content_type("application/json".into())
            .with_message_id(message.message_id.as_str().into());

        let routing_key = if delay_seconds > 0 {
            let expiration_ms = u64::from(delay_seconds) * 1000;
            properties = properties.with_expiration(expiration_ms.to_string().into());
            &self.delay_queue_name
        } else {
            &self.queue_name
        };

        self.channel
            .basic_publish(
                "",
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                properties,
            )
            .await?
            .await?;

        debug!(
            message_id = %message.message_id,
            queue = %routing_key,
            delay_seconds,
            "Notification intent enqueued"
        );

        Ok(message.message_id)
    }
}
