//! Configuration types for catch orchestration.
//!
//! The protocol never bounds how long settlement takes. How long a catcher
//! is willing to wait is therefore configuration, not code. Giving up on a
//! catch does not return the token to the source chain: it stays THROWN
//! there until somebody holding the proof submits the catch.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{PotatoError, Result, RootKind, constants};

/// Polling / backoff policy for `NotYetSettled` and `RootNotSettled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Upper bound for any single delay.
    pub max_interval: Duration,
    /// Factor applied to the delay after each retry (1 = fixed interval).
    pub multiplier: u32,
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Overall wall-clock budget. `None` waits for `max_attempts` only.
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(constants::DEFAULT_RETRY_INITIAL_MS),
            max_interval: Duration::from_millis(constants::DEFAULT_RETRY_MAX_INTERVAL_MS),
            multiplier: constants::DEFAULT_RETRY_MULTIPLIER,
            max_attempts: constants::DEFAULT_RETRY_MAX_ATTEMPTS,
            timeout: Some(Duration::from_millis(constants::DEFAULT_RETRY_TIMEOUT_MS)),
        }
    }
}

impl RetryPolicy {
    /// A fixed-interval policy.
    #[must_use]
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1,
            max_attempts,
            timeout: None,
        }
    }

    /// Delay to wait after the `attempt`-th failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_interval
            .checked_mul(factor)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }

    /// # Errors
    /// Returns `Configuration` if the policy can never make an attempt or
    /// its intervals are inconsistent.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PotatoError::Configuration(
                "retry.max_attempts must be > 0".into(),
            ));
        }
        if self.multiplier == 0 {
            return Err(PotatoError::Configuration(
                "retry.multiplier must be > 0".into(),
            ));
        }
        if self.max_interval < self.initial_interval {
            return Err(PotatoError::Configuration(
                "retry.max_interval must be >= retry.initial_interval".into(),
            ));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(PotatoError::Configuration(
                "retry.timeout must be non-zero when set".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration of a catcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub retry: RetryPolicy,
    /// Root kind requested from the proof provider.
    pub root_kind: RootKind,
    /// Largest metadata payload a ledger accepts on throw.
    pub max_payload_len: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            root_kind: RootKind::default(),
            max_payload_len: constants::MAX_PAYLOAD_LEN,
        }
    }
}

impl ProtocolConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns `Serialization` on malformed JSON, `Configuration` on invalid
    /// values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Configuration` on invalid values.
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;
        if self.max_payload_len > constants::MAX_PAYLOAD_LEN {
            return Err(PotatoError::Configuration(format!(
                "max_payload_len {} exceeds wire limit {}",
                self.max_payload_len,
                constants::MAX_PAYLOAD_LEN
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_interval.as_millis(), 1000);
        assert_eq!(policy.max_interval.as_millis(), 30_000);
        assert_eq!(policy.multiplier, 2);
        assert_eq!(policy.max_attempts, 20);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1).as_millis(), 1000);
        assert_eq!(policy.delay_after(2).as_millis(), 2000);
        assert_eq!(policy.delay_after(3).as_millis(), 4000);
        assert_eq!(policy.delay_after(6).as_millis(), 30_000);
        assert_eq!(policy.delay_after(200).as_millis(), 30_000);
    }

    #[test]
    fn fixed_policy_never_grows() {
        let policy = RetryPolicy::fixed(Duration::from_millis(5), 3);
        assert_eq!(policy.delay_after(1), Duration::from_millis(5));
        assert_eq!(policy.delay_after(3), Duration::from_millis(5));
    }

    #[test]
    fn invalid_policies_rejected() {
        let mut policy = RetryPolicy::default();
        policy.max_attempts = 0;
        assert!(matches!(
            policy.validate(),
            Err(PotatoError::Configuration(_))
        ));

        let mut policy = RetryPolicy::default();
        policy.max_interval = Duration::from_millis(1);
        assert!(policy.validate().is_err());

        let mut policy = RetryPolicy::default();
        policy.timeout = Some(Duration::ZERO);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn config_from_partial_json() {
        let cfg = ProtocolConfig::from_json_str(r#"{"root_kind":"Latest"}"#).unwrap();
        assert_eq!(cfg.root_kind, RootKind::Latest);
        assert_eq!(cfg.retry, RetryPolicy::default());
    }

    #[test]
    fn config_rejects_bad_values() {
        let json = r#"{"max_payload_len": 100000000}"#;
        assert!(matches!(
            ProtocolConfig::from_json_str(json),
            Err(PotatoError::Configuration(_))
        ));
        assert!(matches!(
            ProtocolConfig::from_json_str("{not json"),
            Err(PotatoError::Serialization(_))
        ));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = ProtocolConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(ProtocolConfig::from_json_str(&json).unwrap(), cfg);
    }
}
