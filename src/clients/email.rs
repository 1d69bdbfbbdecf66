use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use reqwest::Client;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    clients::circuit_breaker::CircuitBreaker,
    config::Config,
    models::{
        email::{EmailRequest, EmailResponse},
        retry::RetryConfig,
    },
    utils::retry_with_backoff,
};

/// Sends plain-text e-mail through an HTTP gateway.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    sender: String,
    retry_config: RetryConfig,
    circuit_breaker: Option<CircuitBreaker>,
}

impl EmailClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::from_parts(
            &config.email_gateway_url,
            &config.email_api_key,
            &config.email_sender,
            config.retry_config(),
        )
    }

    pub fn from_parts(
        base_url: &str,
        api_key: &str,
        sender: &str,
        retry_config: RetryConfig,
    ) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url, "E-mail client initialized");

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            sender: sender.to_string(),
            retry_config,
            circuit_breaker: None,
        })
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreaker) -> Self {
        self.circuit_breaker = Some(circuit_breaker);
        self
    }

    /// Returns the gateway's message id, or a generated one if it sends none.
    pub async fn send_email(&self, to: &str, subject: &str, text: &str) -> Result<String, Error> {
        debug!(to, subject, "Sending e-mail notification");

        let request = EmailRequest {
            from: self.sender.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        };

        let http_client = self.http_client.clone();
        let url = format!("{}/v1/messages", self.base_url);
        let api_key = self.api_key.clone();
        let retry_config = self.retry_config.clone();

        match &self.circuit_breaker {
            Some(circuit_breaker) => {
                circuit_breaker
                    .call(|| Self::send_with_retry(http_client, url, api_key, retry_config, request))
                    .await
            }
            None => Self::send_with_retry(http_client, url, api_key, retry_config, request).await,
        }
    }

    async fn send_with_retry(
        http_client: Client,
        url: String,
        api_key: String,
        retry_config: RetryConfig,
        request: EmailRequest,
    ) -> Result<String, Error> {
        retry_with_backoff(&retry_config, || {
            Self::send_once(&http_client, &url, &api_key, &request)
        })
        .await
    }

    async fn send_once(
        http_client: &Client,
        url: &str,
        api_key: &str,
        request: &EmailRequest,
    ) -> Result<String, Error> {
        let response = http_client
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let message_id = serde_json::from_str::<EmailResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.id)
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            info!(to = %request.to, message_id = %message_id, "E-mail accepted by gateway");
            Ok(message_id)
        } else {
            Err(anyhow!("E-mail gateway returned {}: {}", status, body))
        }
    }
}
