//! Shared configuration defaults.
//!
//! Constants and environment lookups used by the device integrations, kept
//! in one place so every crate agrees on the same defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default pause between successive transmit commands, in seconds.
pub const DEFAULT_DELAY_SECS: f64 = 0.4;

/// Key prefix that marks a received RF signal in a pushed device state.
pub const TRIGGER_PREFIX: &str = "rfTrig";

/// Event name constants
pub mod events {
    pub const REMOTE_TRIGGERED: &str = "remote-triggered";
    pub const STATE_CHANGED: &str = "state-changed";
}

/// Entity domain constants
pub mod domains {
    pub const REMOTE: &str = "remote";
}

/// Environment variable names
pub mod env_vars {
    use super::DEFAULT_DELAY_SECS;
    use std::time::Duration;

    pub const DELAY_SECS: &str = "RFBRIDGE_DELAY_SECS";
    pub const LOG_JSON: &str = "RFBRIDGE_LOG_JSON";

    /// Inter-command delay from the environment, or the default.
    pub fn delay_secs() -> f64 {
        std::env::var(DELAY_SECS)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| Duration::try_from_secs_f64(*v).is_ok())
            .unwrap_or(DEFAULT_DELAY_SECS)
    }

    /// Whether logs should be emitted as JSON.
    pub fn log_json() -> bool {
        std::env::var(LOG_JSON)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false)
    }
}

/// Settings for remote entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Pause between commands of one `send_command` call, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
}

fn default_delay_secs() -> f64 {
    DEFAULT_DELAY_SECS
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_DELAY_SECS,
        }
    }
}

impl RemoteConfig {
    /// Build a config with an explicit delay.
    pub fn with_delay_secs(delay_secs: f64) -> Result<Self> {
        let config = Self { delay_secs };
        config.validate()?;
        Ok(config)
    }

    /// Build a config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            delay_secs: env_vars::delay_secs(),
        }
    }

    /// Parse a config from JSON, e.g. `{"delay_secs": 0.5}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Duration::try_from_secs_f64(self.delay_secs).map_err(|e| {
            Error::Configuration(format!(
                "delay_secs must be a non-negative number of seconds, got {}: {}",
                self.delay_secs, e
            ))
        })?;
        Ok(())
    }

    /// The default delay as a [`Duration`].
    ///
    /// Out-of-range values of an unvalidated config saturate: negative or NaN
    /// gives zero, too large gives [`Duration::MAX`].
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or(if self.delay_secs > 0.0 {
            Duration::MAX
        } else {
            Duration::ZERO
        })
    }
}
