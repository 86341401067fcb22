//! Runtime configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `RELAY_LISTEN_ADDR` | `0.0.0.0:3000` |
//! | `GITHUB_WEBHOOK_SECRET` | required |
//! | `GITHUB_TOKEN` | required |
//! | `SLACK_BOT_TOKEN` | required |
//! | `SLACK_CHANNEL` | required |
//! | `RELAY_CACHE_CAPACITY` | `1000` |
//! | `RELAY_DRAIN_TIMEOUT_SECS` | `10` |
//! | `RELAY_OPT_IN_FLAG` | `SLACK_NOTIFY` |

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

use thiserror::Error;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::eligibility::DEFAULT_OPT_IN_FLAG;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub webhook_secret: String,
    pub github_token: String,
    pub slack_token: String,
    pub slack_channel: String,
    pub cache_capacity: NonZeroUsize,
    /// Upper bound on waiting for queued events at shutdown.
    pub drain_timeout: Duration,
    pub opt_in_flag: String,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's value
    /// if it is set. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let listen_addr = match get("RELAY_LISTEN_ADDR") {
            Some(value) => parse("RELAY_LISTEN_ADDR", value)?,
            None => parse("RELAY_LISTEN_ADDR", DEFAULT_LISTEN_ADDR.to_string())?,
        };
        let cache_capacity = match get("RELAY_CACHE_CAPACITY") {
            Some(value) => parse("RELAY_CACHE_CAPACITY", value)?,
            None => DEFAULT_CACHE_CAPACITY,
        };
        let drain_timeout = match get("RELAY_DRAIN_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse("RELAY_DRAIN_TIMEOUT_SECS", value)?),
            None => DEFAULT_DRAIN_TIMEOUT,
        };

        Ok(Config {
            listen_addr,
            webhook_secret: required("GITHUB_WEBHOOK_SECRET")?,
            github_token: required("GITHUB_TOKEN")?,
            slack_token: required("SLACK_BOT_TOKEN")?,
            slack_channel: required("SLACK_CHANNEL")?,
            cache_capacity,
            drain_timeout,
            opt_in_flag: get("RELAY_OPT_IN_FLAG").unwrap_or_else(|| DEFAULT_OPT_IN_FLAG.to_string()),
        })
    }
}

fn parse<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("slack_channel", &self.slack_channel)
            .field("cache_capacity", &self.cache_capacity)
            .field("drain_timeout", &self.drain_timeout)
            .field("opt_in_flag", &self.opt_in_flag)
            .finish_non_exhaustive()
    }
}
