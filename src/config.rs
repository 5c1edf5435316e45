//! Generator Configuration
//!
//! Loaded from environment variables or a JSON file; every field has a
//! default suitable for a local demo.

use std::path::Path;
use std::time::Duration;

use serde::{Serialize, Deserialize};

use crate::core::types::{Address, KeyHash};
use crate::error::ConfigError;
use crate::generator::GeneratorParams;

/// Runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Owner account.
    pub owner: Address,
    /// Extra executor ([`Address::ZERO`] for none).
    pub executor: Address,
    /// Identity used when requesting randomness.
    pub consumer: Address,
    /// Oracle handle.
    pub oracle: Address,
    /// Maximum generated-but-unrevealed sequences.
    pub max_depth: u64,
    /// Oracle fulfilment window in seconds.
    pub max_pending_secs: u64,
    /// Seed for the local oracle's value stream.
    pub oracle_seed: u64,
    /// Local oracle delivery period in milliseconds.
    pub delivery_interval_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            owner: Address::repeat(0x01),
            executor: Address::ZERO,
            consumer: Address::repeat(0x0C),
            oracle: Address::repeat(0x0A),
            max_depth: 1,
            max_pending_secs: 300,
            oracle_seed: 12345,
            delivery_interval_ms: 250,
        }
    }
}

impl GeneratorConfig {
    /// Create config from `SEEDGEN_*` environment variables, falling back to
    /// defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("SEEDGEN_OWNER") {
            config.owner = parse_address("SEEDGEN_OWNER", &v)?;
        }
        if let Some(v) = lookup("SEEDGEN_EXECUTOR") {
            config.executor = parse_address("SEEDGEN_EXECUTOR", &v)?;
        }
        if let Some(v) = lookup("SEEDGEN_CONSUMER") {
            config.consumer = parse_address("SEEDGEN_CONSUMER", &v)?;
        }
        if let Some(v) = lookup("SEEDGEN_ORACLE") {
            config.oracle = parse_address("SEEDGEN_ORACLE", &v)?;
        }
        if let Some(v) = lookup("SEEDGEN_MAX_DEPTH") {
            config.max_depth = parse_u64("SEEDGEN_MAX_DEPTH", &v)?;
        }
        if let Some(v) = lookup("SEEDGEN_MAX_PENDING_SECS") {
            config.max_pending_secs = parse_u64("SEEDGEN_MAX_PENDING_SECS", &v)?;
        }
        if let Some(v) = lookup("SEEDGEN_ORACLE_SEED") {
            config.oracle_seed = parse_u64("SEEDGEN_ORACLE_SEED", &v)?;
        }
        if let Some(v) = lookup("SEEDGEN_DELIVERY_INTERVAL_MS") {
            config.delivery_interval_ms = parse_u64("SEEDGEN_DELIVERY_INTERVAL_MS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the generator would refuse anyway.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be positive".into()));
        }
        if self.oracle.is_zero() {
            return Err(ConfigError::Invalid("oracle handle must not be null".into()));
        }
        if self.owner.is_zero() {
            return Err(ConfigError::Invalid("owner must not be null".into()));
        }
        if self.delivery_interval_ms == 0 {
            return Err(ConfigError::Invalid("delivery_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Oracle delivery period.
    pub fn delivery_interval(&self) -> Duration {
        Duration::from_millis(self.delivery_interval_ms)
    }

    /// Generator construction parameters for the given key commitment.
    pub fn params(&self, key_hash: KeyHash) -> GeneratorParams {
        GeneratorParams {
            owner: self.owner,
            executor: self.executor,
            consumer: self.consumer,
            key_hash,
            max_depth: self.max_depth,
        }
    }
}

fn parse_address(var: &'static str, value: &str) -> Result<Address, ConfigError> {
    Address::from_hex(value).map_err(|e| ConfigError::InvalidVar { var, reason: e.to_string() })
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidVar { var, reason: e.to_string() })
}
