//! Executor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Pacing and deadline settings for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Minimum pause between the end of one record and the start of the next
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Deadline for the target to acknowledge a single step
    #[serde(rename = "step-timeout-ms", default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    750
}

fn default_step_timeout_ms() -> u64 {
    10_000
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            step_timeout_ms: default_step_timeout_ms(),
        }
    }
}

impl ExecutorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    /// Reject settings no run could honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_timeout_ms == 0 {
            return Err(ConfigError::ZeroStepTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.settle_delay_ms, 750);
        assert_eq!(config.step_timeout_ms, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let config = ExecutorConfig {
            settle_delay_ms: 250,
            step_timeout_ms: 100,
        };
        assert_eq!(config.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.step_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_step_timeout_rejected() {
        let config = ExecutorConfig {
            step_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroStepTimeout)));
    }

    #[test]
    fn test_negative_delay_does_not_parse() {
        let result: Result<ExecutorConfig, _> = serde_yaml::from_str("settle-delay-ms: -5");
        assert!(result.is_err());
    }
}
