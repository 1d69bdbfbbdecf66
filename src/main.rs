use std::sync::Arc;

use anyhow::{Error, Result};
use storefront_service::{
    api::{AppState, run_api_server},
    clients::{
        KeyValueStore, ObjectStore, QueueService, TopicService, circuit_breaker::CircuitBreaker,
        email::EmailClient, health::EMAIL_GATEWAY_SERVICE, objects::S3ObjectStore,
        rbmq::RabbitMqClient, store::RedisStore, topics::RedisTopicService,
    },
    config::Config,
    notifications::{dispatcher::NotificationDispatcher, renderer::NotificationRenderer},
    worker::run_worker,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Error> {
    fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::load()?;

    let store: Arc<dyn KeyValueStore> = Arc::new(RedisStore::connect(&config).await?);
    let objects: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::connect(&config).await?);

    let circuit_breaker = CircuitBreaker::connect(EMAIL_GATEWAY_SERVICE, &config).await?;
    let email_client = EmailClient::new(&config)?.with_circuit_breaker(circuit_breaker);
    let topics: Arc<dyn TopicService> =
        Arc::new(RedisTopicService::connect(&config, email_client).await?);

    let rabbitmq = Arc::new(RabbitMqClient::connect(&config).await?);
    let queue: Arc<dyn QueueService> = rabbitmq.clone();

    let dispatcher = NotificationDispatcher::new(
        Arc::clone(&topics),
        queue,
        config.signup_delay_seconds,
    );
    let state = Arc::new(
        AppState::new(store, objects, dispatcher, config.tables())
            .with_fatal_notifications(config.notification_failure_fatal)
            .with_max_upload_bytes(config.max_upload_bytes),
    );
    let renderer = NotificationRenderer::new(topics);

    info!(
        queue = %config.notification_queue_name,
        signup_delay_seconds = config.signup_delay_seconds,
        "Storefront service starting"
    );

    tokio::select! {
        result = run_api_server(config.clone(), state) => {
            if let Err(e) = &result {
                error!(error = %e, "API server stopped");
            }
            result
        }
        result = run_worker(rabbitmq, renderer) => {
            if let Err(e) = &result {
                error!(error = %e, "Notification worker stopped");
            }
            result
        }
    }
}
