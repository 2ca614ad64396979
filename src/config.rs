//! Configuration management for Tollbooth.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main configuration for the Tollbooth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TollboothConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission (rate limiting) configuration
    #[serde(default)]
    pub admission: AdmissionConfig,
}

impl Default for TollboothConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            admission: AdmissionConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:8000".parse().unwrap()
}

/// Admission configuration.
///
/// All four tunables are read once at startup; there is no runtime
/// reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Tokens granted per second of elapsed time
    #[serde(default = "default_refill_rate")]
    pub refill_rate: f64,

    /// Maximum tokens a client can bank (largest allowed burst)
    #[serde(default = "default_burst_capacity")]
    pub burst_capacity: u32,

    /// Seconds of inactivity after which a client record is evicted
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Seconds between eviction sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            refill_rate: default_refill_rate(),
            burst_capacity: default_burst_capacity(),
            idle_timeout_secs: default_idle_timeout(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_refill_rate() -> f64 {
    2.0
}

fn default_burst_capacity() -> u32 {
    4
}

fn default_idle_timeout() -> u64 {
    180
}

fn default_sweep_interval() -> u64 {
    2
}

impl TollboothConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TollboothConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::TollboothError::Config(e.to_string()))?;
        Ok(config)
    }
}
