//! Broker configuration
//!
//! Bind address comes from the command line (first argument); sweep
//! cadence and the TEMPORARY time-to-live come from environment
//! variables so deployments can tune expiry without a rebuild.

use std::env;
use std::time::Duration;

/// Default bind address
const DEFAULT_ADDR: &str = "127.0.0.1:65432";

/// Default seconds between expiry sweeps
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5;

/// Default time-to-live for TEMPORARY messages, in seconds
const DEFAULT_TEMP_TTL_SECS: u64 = 60;

/// Runtime settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the listener binds to
    pub addr: String,
    /// Cadence of the expiry sweeper
    pub sweep_interval: Duration,
    /// TTL applied to TEMPORARY messages
    pub temp_ttl: Duration,
}

impl Config {
    /// Build the configuration from argv and the environment.
    pub fn from_env() -> Self {
        Self {
            addr: env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            sweep_interval: Duration::from_secs(env_secs(
                "CHAT_BROKER_SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            )),
            temp_ttl: Duration::from_secs(env_secs(
                "CHAT_BROKER_TEMP_TTL_SECS",
                DEFAULT_TEMP_TTL_SECS,
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            temp_ttl: Duration::from_secs(DEFAULT_TEMP_TTL_SECS),
        }
    }
}

fn env_secs(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
