//! Engine configuration
//!
//! Only the fallback path has tunables; the rule-based fast path is pure
//! computation and needs none.

use crate::error::{CommandError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the fallback resolver and the gateway call it makes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for a single gateway attempt, in milliseconds.
    ///
    /// Expiry is treated exactly like a gateway failure.
    pub gateway_timeout_ms: u64,

    /// Extra gateway attempts after a retryable failure. At most 1.
    pub max_retries: u32,

    /// Pause before the retry, in milliseconds.
    pub retry_backoff_ms: u64,

    /// Sampling temperature for the classification call.
    ///
    /// Zero, because the answer must be one name from a closed menu.
    pub temperature: f32,

    /// Output budget for the classification call. An intent name fits in a
    /// handful of tokens.
    pub max_output_tokens: u32,

    /// Model used when the caller does not name one.
    pub default_model: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gateway_timeout_ms: 4_000,
            max_retries: 1,
            retry_backoff_ms: 250,
            temperature: 0.0,
            max_output_tokens: 16,
            default_model: "gpt-4o".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Worst-case time the fallback path can spend waiting on the gateway.
    pub fn fallback_latency_bound(&self) -> Duration {
        let attempts = 1 + self.max_retries.min(1);
        self.gateway_timeout() * attempts + self.retry_backoff() * self.max_retries.min(1)
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Defaults overridden by `VOICE_ROUTER_*` environment variables.
    ///
    /// Recognized: `VOICE_ROUTER_TIMEOUT_MS`, `VOICE_ROUTER_MAX_RETRIES`,
    /// `VOICE_ROUTER_BACKOFF_MS`, `VOICE_ROUTER_MODEL`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = env_parse::<u64>("VOICE_ROUTER_TIMEOUT_MS")? {
            config.gateway_timeout_ms = v;
        }
        if let Some(v) = env_parse::<u32>("VOICE_ROUTER_MAX_RETRIES")? {
            config.max_retries = v;
        }
        if let Some(v) = env_parse::<u64>("VOICE_ROUTER_BACKOFF_MS")? {
            config.retry_backoff_ms = v;
        }
        if let Ok(model) = std::env::var("VOICE_ROUTER_MODEL") {
            if !model.trim().is_empty() {
                config.default_model = model.trim().to_string();
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.gateway_timeout_ms == 0 {
            return Err(CommandError::Config("gateway_timeout_ms must be positive".into()));
        }
        if self.max_retries > 1 {
            return Err(CommandError::Config(format!(
                "max_retries ({}) must be 0 or 1",
                self.max_retries
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(CommandError::Config(format!(
                "temperature ({}) must be within 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(CommandError::Config("max_output_tokens must be positive".into()));
        }
        if self.default_model.trim().is_empty() {
            return Err(CommandError::Config("default_model must not be empty".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CommandError::Config(format!("{} is not a valid number: {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway_timeout(), Duration::from_secs(4));
        assert_eq!(config.fallback_latency_bound(), Duration::from_millis(8_250));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("gateway_timeout_ms = 1500\n").unwrap();
        assert_eq!(config.gateway_timeout_ms, 1500);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.default_model, "gpt-4o");
    }

    #[test]
    fn test_rejects_second_retry() {
        let err = EngineConfig::from_toml_str("max_retries = 3\n").unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));
    }

    #[test]
    fn test_rejects_garbage_toml() {
        let err = EngineConfig::from_toml_str("gateway_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, CommandError::Toml(_)));
    }

    #[test]
    fn test_no_retry_bound() {
        let config = EngineConfig {
            gateway_timeout_ms: 100,
            max_retries: 0,
            retry_backoff_ms: 50,
            ..EngineConfig::default()
        };
        assert_eq!(config.fallback_latency_bound(), Duration::from_millis(100));
    }
}
