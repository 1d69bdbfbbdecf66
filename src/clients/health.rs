use std::{collections::BTreeMap, time::Instant};

use anyhow::Result;
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::{
    clients::{circuit_breaker::CircuitBreaker, rbmq::RabbitMqClient},
    config::Config,
    models::{
        circuit_breaker::CircuitState,
        health::{HealthCheckResponse, ServiceHealth},
    },
};

pub const EMAIL_GATEWAY_SERVICE: &str = "email_gateway";

const CRITICAL_SERVICES: [&str; 2] = ["key_value_store", "message_broker"];

pub struct HealthChecker {
    config: Config,
}

impl HealthChecker {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = BTreeMap::new();

        checks.insert("key_value_store".to_string(), self.check_redis().await);
        checks.insert("message_broker".to_string(), self.check_rabbitmq().await);
        checks.insert(
            EMAIL_GATEWAY_SERVICE.to_string(),
            self.check_circuit_breaker(EMAIL_GATEWAY_SERVICE).await,
        );

        HealthCheckResponse::from_checks(checks, &CRITICAL_SERVICES)
    }

    async fn check_redis(&self) -> ServiceHealth {
        let start = Instant::now();

        match redis::Client::open(self.config.redis_url.as_str()) {
            Ok(client) => match client.get_multiplexed_async_connection().await {
                Ok(mut conn) => match conn.ping::<String>().await {
                    Ok(_) => {
                        let elapsed = start.elapsed().as_millis() as u64;
                        debug!(response_time_ms = elapsed, "Redis health check passed");
                        ServiceHealth::healthy(elapsed)
                    }
                    Err(e) => {
                        warn!(error = %e, "Redis ping failed");
                        ServiceHealth::unhealthy(format!("Ping failed: {}", e))
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Redis connection failed");
                    ServiceHealth::unhealthy(format!("Connection failed: {}", e))
                }
            },
            Err(e) => {
                warn!(error = %e, "Redis client creation failed");
                ServiceHealth::unhealthy(format!("Client creation failed: {}", e))
            }
        }
    }

    async fn check_rabbitmq(&self) -> ServiceHealth {
        let start = Instant::now();

        match RabbitMqClient::connect(&self.config).await {
            Ok(_) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(response_time_ms = elapsed, "RabbitMQ health check passed");
                ServiceHealth::healthy(elapsed)
            }
            Err(e) => {
                warn!(error = %e, "RabbitMQ connection failed");
                ServiceHealth::unhealthy(format!("Connection failed: {}", e))
            }
        }
    }

    async fn check_circuit_breaker(&self, service_name: &str) -> ServiceHealth {
        match self.get_circuit_breaker_state(service_name).await {
            Ok(state) => {
                let state_str = state.to_string();
                debug!(
                    service = service_name,
                    circuit_state = %state_str,
                    "Circuit breaker state checked"
                );

                match state {
                    CircuitState::Closed => ServiceHealth::healthy(0).with_circuit_breaker(state_str),
                    CircuitState::HalfOpen => ServiceHealth::degraded(
                        state_str,
                        Some("Circuit breaker in recovery mode".to_string()),
                    ),
                    CircuitState::Open => ServiceHealth::degraded(state_str, None),
                }
            }
            Err(e) => {
                warn!(
                    service = service_name,
                    error = %e,
                    "Failed to check circuit breaker state"
                );
                ServiceHealth::unhealthy(format!("Cannot check circuit breaker: {}", e))
            }
        }
    }

    async fn get_circuit_breaker_state(&self, service_name: &str) -> Result<CircuitState> {
        let client = redis::Client::open(self.config.redis_url.as_str())?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        CircuitBreaker::stored_state(&mut conn, service_name).await
    }
}
