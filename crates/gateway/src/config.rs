//! Gateway configuration: bind address, config directory, poll cadence.

use crate::monitor::DEFAULT_POLL_INTERVAL;
use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;

/// Runtime configuration, resolved once at startup and passed down
/// explicitly; there is no ambient global config.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Directory holding the auth token and trusted device registry
    pub config_dir: PathBuf,
    pub poll_interval: Duration,
}

impl Config {
    /// Resolve configuration from environment variables, falling back
    /// to defaults (`0.0.0.0:5000`, `~/.tunebridge`, 500 ms polling).
    pub fn from_env() -> Result<Self> {
        let host = match std::env::var("TUNEBRIDGE_HOST") {
            Ok(raw) => raw.parse().context("invalid TUNEBRIDGE_HOST")?,
            Err(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match std::env::var("TUNEBRIDGE_PORT") {
            Ok(raw) => raw.parse().context("invalid TUNEBRIDGE_PORT")?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            port,
            config_dir: default_config_dir()?,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// The fixed per-user config directory.
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".tunebridge"))
        .context("failed to resolve home directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = Config {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 7777,
            config_dir: PathBuf::from("/tmp/x"),
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:7777");
    }

    #[test]
    fn test_default_config_dir_is_home_relative() {
        let dir = default_config_dir().unwrap();
        assert!(dir.ends_with(".tunebridge"));
    }
}
