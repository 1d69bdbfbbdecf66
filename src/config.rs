use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::models::{circuit_breaker::CircuitBreakerConfig, retry::RetryConfig};

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub rabbitmq_url: String,
    #[serde(default = "default_notification_queue_name")]
    pub notification_queue_name: String,
    #[serde(default = "default_failed_queue_name")]
    pub failed_queue_name: String,
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: u16,

    pub redis_url: String,

    #[serde(default = "default_users_table")]
    pub users_table: String,
    #[serde(default = "default_products_table")]
    pub products_table: String,
    #[serde(default = "default_orders_table")]
    pub orders_table: String,

    #[serde(default = "default_topic_namespace")]
    pub topic_namespace: String,
    #[serde(default = "default_signup_delay_seconds")]
    pub signup_delay_seconds: u32,
    #[serde(default)]
    pub notification_failure_fatal: bool,

    pub email_gateway_url: String,
    pub email_api_key: String,
    pub email_sender: String,

    #[serde(default = "default_failure_threshold")]
    pub circuit_breaker_failure_threshold: u32,
    #[serde(default = "default_circuit_timeout_seconds")]
    pub circuit_breaker_timeout_seconds: u64,
    #[serde(default = "default_success_threshold")]
    pub circuit_breaker_success_threshold: u32,

    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_retry_backoff_multiplier")]
    pub retry_backoff_multiplier: u64,

    #[serde(default = "default_upload_bucket")]
    pub upload_bucket: String,
    #[serde(default = "default_object_store_region")]
    pub object_store_region: String,
    /// S3-compatible endpoint such as MinIO. Unset means AWS.
    pub object_store_endpoint: Option<String>,
    pub upload_public_base_url: Option<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        Ok(config)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            initial_delay_ms: self.initial_retry_delay_ms,
            max_delay_ms: self.max_retry_delay_ms,
            backoff_multiplier: self.retry_backoff_multiplier,
        }
    }

    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_breaker_failure_threshold,
            reset_timeout_seconds: self.circuit_breaker_timeout_seconds,
            success_threshold: self.circuit_breaker_success_threshold,
        }
    }

    pub fn tables(&self) -> TableNames {
        TableNames {
            users: self.users_table.clone(),
            products: self.products_table.clone(),
            orders: self.orders_table.clone(),
        }
    }

    pub fn delay_queue_name(&self) -> String {
        format!("{}.delay", self.notification_queue_name)
    }

    /// Prefix of the URLs returned for uploaded objects, without a trailing slash.
    pub fn upload_base_url(&self) -> String {
        match &self.upload_public_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.s3.amazonaws.com", self.upload_bucket),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableNames {
    pub users: String,
    pub products: String,
    pub orders: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            users: default_users_table(),
            products: default_products_table(),
            orders: default_orders_table(),
        }
    }
}

fn default_notification_queue_name() -> String {
    "notifications".to_string()
}

fn default_failed_queue_name() -> String {
    "notifications.failed".to_string()
}

fn default_prefetch_count() -> u16 {
    10
}

fn default_users_table() -> String {
    "UsersTable".to_string()
}

fn default_products_table() -> String {
    "ProductsTable".to_string()
}

fn default_orders_table() -> String {
    "OrdersTable".to_string()
}

pub fn default_topic_namespace() -> String {
    "arn:storefront:us-east-1:000000000000".to_string()
}

/// Gives the subscriber time to confirm before the first delivery.
pub fn default_signup_delay_seconds() -> u32 {
    40
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_circuit_timeout_seconds() -> u64 {
    60
}

fn default_success_threshold() -> u32 {
    2
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_initial_retry_delay_ms() -> u64 {
    200
}

fn default_max_retry_delay_ms() -> u64 {
    5_000
}

fn default_retry_backoff_multiplier() -> u64 {
    2
}

fn default_upload_bucket() -> String {
    "clothing-images-ecom".to_string()
}

fn default_object_store_region() -> String {
    "us-east-1".to_string()
}

pub fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_server_port() -> u16 {
    3000
}
