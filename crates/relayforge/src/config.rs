//! Process configuration read from the environment.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `HOST` | `0.0.0.0` | interface to listen on |
//! | `PORT` | `3000` | port to listen on |
//! | `RELAY_IDLE_TIMEOUT_SECS` | unset | drop connections silent for this long |
//!
//! Sessions themselves never expire; the idle timeout only concerns dead
//! transport connections, and is off unless set.

use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default listening interface.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// A setting that couldn't be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}={value:?}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for one relay process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `None` means a connection may stay silent forever.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// [`ConfigError::InvalidVar`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = var("HOST") {
            config.host = host.trim().to_string();
        }

        if let Some(port) = var("PORT") {
            config.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidVar {
                    name: "PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(secs) = var("RELAY_IDLE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidVar {
                    name: "RELAY_IDLE_TIMEOUT_SECS",
                    value: secs.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// The `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
