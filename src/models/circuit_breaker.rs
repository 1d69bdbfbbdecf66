use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Breaker state as persisted in the `state` field of `circuit:<service>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// A missing or unrecognised stored value reads as closed.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("open") => CircuitState::Open,
            Some("half_open") => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl Display for CircuitState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive gateway failures that open the breaker.
    pub failure_threshold: u32,
    /// Seconds an open breaker waits before letting a trial request through.
    pub reset_timeout_seconds: u64,
    /// Half-open successes needed to close again.
    pub success_threshold: u32,
}
