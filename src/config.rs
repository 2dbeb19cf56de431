//! Relay configuration from CLI arguments and environment variables.
//!
//! A local `.env` file is loaded first when present, so every flag can also be
//! set there. Command-line values win over the environment.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, warn};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "relay", about = "Websocket relay that forwards every message to all other peers")]
pub struct RelayConfig {
    /// Port to listen on.
    #[arg(env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Interface address to bind.
    #[arg(long, env = "RELAY_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Seconds between liveness pings.
    #[arg(long, env = "RELAY_PING_INTERVAL_SECS", default_value_t = DEFAULT_PING_INTERVAL_SECS)]
    pub ping_interval_secs: u64,

    /// Per-peer outbound queue length. Payloads past this are dropped for that peer.
    #[arg(long, env = "RELAY_OUTBOUND_CAPACITY", default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    pub outbound_capacity: usize,
}

/// Outcome of looking for a `.env` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DotenvStatus {
    Loaded,
    Missing,
    Invalid,
}

/// Log the result of loading `.env`. Only a missing file is silent.
pub(crate) fn report_dotenv(result: Result<PathBuf, dotenvy::Error>) -> DotenvStatus {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "config: loaded .env");
            DotenvStatus::Loaded
        }
        Err(e) if e.not_found() => DotenvStatus::Missing,
        Err(e) => {
            warn!(error = %e, "config: ignoring .env");
            DotenvStatus::Invalid
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Load `.env` (if any), parse the process arguments, and validate.
    /// A `.env` that exists but cannot be read or parsed is logged and skipped.
    ///
    /// Exits the process with usage help on malformed arguments, like any
    /// clap-based binary.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a parsed value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        report_dotenv(dotenvy::dotenv());
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ping_interval_secs == 0 {
            return Err(ConfigError::ZeroPingInterval);
        }
        if self.outbound_capacity == 0 {
            return Err(ConfigError::ZeroOutboundCapacity);
        }
        self.listen_addr()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBindAddr` if `bind` is not an IP address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(self.bind.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
