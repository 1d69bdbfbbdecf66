use std::collections::HashMap;

use anyhow::{Error, Result, anyhow};
use chrono::Utc;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    models::circuit_breaker::{CircuitBreakerConfig, CircuitState},
};

const STATE: &str = "state";
const FAILURES: &str = "failures";
const SUCCESSES: &str = "successes";
const OPENED_AT: &str = "opened_at";
const LAST_FAILURE_AT: &str = "last_failure_at";

/// What an incoming call is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Allow,
    /// The reset timeout elapsed; one trial call goes through.
    Trial,
    Reject,
}

/// Breaker fields as read from the `circuit:<service>` hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Snapshot {
    state: CircuitState,
    failures: u32,
    opened_at: Option<u64>,
    last_failure_at: Option<u64>,
}

impl Snapshot {
    fn from_fields(fields: &HashMap<String, String>) -> Self {
        let timestamp = |name: &str| fields.get(name).and_then(|v| v.parse::<u64>().ok());

        Self {
            state: CircuitState::from_stored(fields.get(STATE).map(String::as_str)),
            failures: fields
                .get(FAILURES)
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(0),
            opened_at: timestamp(OPENED_AT),
            last_failure_at: timestamp(LAST_FAILURE_AT),
        }
    }

    fn admission(&self, now: u64, reset_timeout_seconds: u64) -> Admission {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => Admission::Allow,
            // An open breaker with no recorded opening time gets a trial call.
            CircuitState::Open => match self.opened_at {
                Some(opened_at) if now.saturating_sub(opened_at) < reset_timeout_seconds => {
                    Admission::Reject
                }
                _ => Admission::Trial,
            },
        }
    }

    /// Failures only count as consecutive inside the reset window.
    fn next_failure_count(&self, now: u64, reset_timeout_seconds: u64) -> u32 {
        match self.last_failure_at {
            Some(last) if now.saturating_sub(last) < reset_timeout_seconds => self.failures + 1,
            _ => 1,
        }
    }
}

/// Guards the e-mail gateway. State lives in one Redis hash per service so
/// every replica shares the same breaker.
pub struct CircuitBreaker {
    service_name: String,
    connection: MultiplexedConnection,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(
        service_name: String,
        connection: MultiplexedConnection,
        config: CircuitBreakerConfig,
    ) -> Self {
        info!(service = %service_name, "Circuit breaker initialized");

        Self {
            service_name,
            connection,
            config,
        }
    }

    pub async fn connect(service_name: &str, config: &Config) -> Result<Self, Error> {
        let client = Client::open(config.redis_url.as_str())
            .map_err(|_| anyhow!("Failed to create redis client"))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|_| anyhow!("Failed to connect to redis client"))?;

        Ok(Self::new(
            service_name.to_string(),
            connection,
            config.circuit_breaker_config(),
        ))
    }

    pub fn hash_key(service_name: &str) -> String {
        format!("circuit:{}", service_name)
    }

    /// Reads only the state field, for health reporting.
    pub async fn stored_state(
        connection: &mut MultiplexedConnection,
        service_name: &str,
    ) -> Result<CircuitState, Error> {
        let value: Option<String> = connection.hget(Self::hash_key(service_name), STATE).await?;

        Ok(CircuitState::from_stored(value.as_deref()))
    }

    pub async fn call<F, Fut, T>(&self, operation: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, Error>>,
    {
        let snapshot = self.load().await?;

        match snapshot.admission(now_seconds(), self.config.reset_timeout_seconds) {
            Admission::Reject => {
                warn!(service = %self.service_name, "Circuit breaker is open, rejecting request");
                return Err(anyhow!("Circuit breaker is open for {}", self.service_name));
            }
            Admission::Trial => {
                info!(service = %self.service_name, "Circuit breaker attempting reset");
                self.write(&[
                    (STATE, CircuitState::HalfOpen.as_str().to_string()),
                    (SUCCESSES, "0".to_string()),
                ])
                .await?;
            }
            Admission::Allow => {}
        }

        // Once the operation has run, its outcome is what the caller gets.
        // Bookkeeping failures are only logged.
        let outcome = operation().await;

        let bookkeeping = match &outcome {
            Ok(_) => self.record_success().await,
            Err(_) => self.record_failure().await,
        };

        if let Err(e) = bookkeeping {
            warn!(
                service = %self.service_name,
                succeeded = outcome.is_ok(),
                error = %e,
                "Failed to record circuit breaker outcome"
            );
        }

        outcome
    }

    async fn record_success(&self) -> Result<(), Error> {
        let snapshot = self.load().await?;
        let mut conn = self.connection.clone();
        let key = Self::hash_key(&self.service_name);

        match snapshot.state {
            CircuitState::HalfOpen => {
                let successes: u32 = conn.hincr(&key, SUCCESSES, 1).await?;
                debug!(
                    service = %self.service_name,
                    successes,
                    threshold = self.config.success_threshold,
                    "Circuit breaker success recorded"
                );

                if successes >= self.config.success_threshold {
                    conn.del::<_, ()>(&key).await?;
                    info!(service = %self.service_name, "Circuit breaker closed after successful recovery");
                }
            }
            CircuitState::Closed if snapshot.failures > 0 => {
                conn.hdel::<_, _, ()>(&key, &[FAILURES, LAST_FAILURE_AT]).await?;
            }
            _ => {}
        }

        Ok(())
    }

    async fn record_failure(&self) -> Result<(), Error> {
        let snapshot = self.load().await?;
        let now = now_seconds();

        if snapshot.state == CircuitState::HalfOpen {
            self.open(now).await?;
            warn!(service = %self.service_name, "Circuit breaker reopened after failed recovery attempt");
            return Ok(());
        }

        let failures = snapshot.next_failure_count(now, self.config.reset_timeout_seconds);
        self.write(&[(FAILURES, failures.to_string()), (LAST_FAILURE_AT, now.to_string())])
            .await?;

        debug!(
            service = %self.service_name,
            failures,
            threshold = self.config.failure_threshold,
            "Circuit breaker failure recorded"
        );

        if failures >= self.config.failure_threshold {
            self.open(now).await?;
            warn!(
                service = %self.service_name,
                failures,
                "Circuit breaker opened due to consecutive failures"
            );
        }

        Ok(())
    }

    async fn open(&self, now: u64) -> Result<(), Error> {
        self.write(&[
            (STATE, CircuitState::Open.as_str().to_string()),
            (OPENED_AT, now.to_string()),
            (SUCCESSES, "0".to_string()),
        ])
        .await
    }

    async fn load(&self) -> Result<Snapshot, Error> {
        let mut conn = self.connection.clone();
        let fields: HashMap<String, String> =
            conn.hgetall(Self::hash_key(&self.service_name)).await?;

        Ok(Snapshot::from_fields(&fields))
    }

    async fn write(&self, fields: &[(&str, String)]) -> Result<(), Error> {
        let mut conn = self.connection.clone();
        conn.hset_multiple::<_, _, _, ()>(Self::hash_key(&self.service_name), fields)
            .await?;
        Ok(())
    }
}

fn now_seconds() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
