//! Process-wide execution defaults and the bounds every request is held to.

use std::ops::RangeInclusive;
use std::time::Duration;

use thiserror::Error;

/// Allowed `timeoutSeconds`.
pub const TIMEOUT_SECONDS_RANGE: RangeInclusive<u64> = 1..=300;
/// Allowed `maxRetries`.
pub const MAX_RETRIES_RANGE: RangeInclusive<u64> = 1..=5;
/// Allowed `retryDelaySeconds`.
pub const RETRY_DELAY_SECONDS_RANGE: RangeInclusive<u64> = 1..=60;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: u64 = 3;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 5;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Check `value` against an inclusive range, naming `field` on failure.
pub fn check_range(field: &'static str, value: u64, range: &RangeInclusive<u64>) -> Result<u64, SettingsError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Already-validated defaults handed to the orchestrator at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSettings {
    poll_interval: Duration,
    default_timeout_seconds: u64,
    default_max_retries: u64,
    default_retry_delay_seconds: u64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            default_max_retries: DEFAULT_MAX_RETRIES,
            default_retry_delay_seconds: DEFAULT_RETRY_DELAY_SECONDS,
        }
    }
}

impl ExecutionSettings {
    pub fn new(
        poll_interval: Duration,
        default_timeout_seconds: u64,
        default_max_retries: u64,
        default_retry_delay_seconds: u64,
    ) -> Result<Self, SettingsError> {
        if poll_interval.is_zero() {
            return Err(SettingsError::ZeroPollInterval);
        }
        Ok(Self {
            poll_interval,
            default_timeout_seconds: check_range("timeoutSeconds", default_timeout_seconds, &TIMEOUT_SECONDS_RANGE)?,
            default_max_retries: check_range("maxRetries", default_max_retries, &MAX_RETRIES_RANGE)?,
            default_retry_delay_seconds: check_range(
                "retryDelaySeconds",
                default_retry_delay_seconds,
                &RETRY_DELAY_SECONDS_RANGE,
            )?,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn default_timeout_seconds(&self) -> u64 {
        self.default_timeout_seconds
    }

    pub fn default_max_retries(&self) -> u64 {
        self.default_max_retries
    }

    pub fn default_retry_delay_seconds(&self) -> u64 {
        self.default_retry_delay_seconds
    }
}
