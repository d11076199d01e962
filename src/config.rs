//! Configuration system.
//!
//! Layered configuration with file and environment sources. A TOML file is
//! loaded first when present, then `CALLMUX_`-prefixed environment variables
//! override individual fields (`CALLMUX_RPC_URL`, `CALLMUX_CHAIN_ID`, ...).
//! Validation runs before the config is turned into engine settings.

use crate::engine::EngineConfig;
use crate::error::BatchError;
use crate::logging::LoggingConfig;
use crate::registry::AggregatorRegistry;
use crate::types::BlockId;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallmuxConfig {
    /// JSON-RPC endpoint URL
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Chain id override; discovered from the endpoint when absent
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Execution context used for calls without a block override
    #[serde(default = "default_block")]
    pub default_block: String,

    /// Batching settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Batching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Calls per window before an immediate flush
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_block() -> String {
    "latest".to_string()
}

fn default_max_batch_size() -> usize {
    512
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl Default for CallmuxConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            chain_id: None,
            default_block: default_block(),
            batch: BatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CallmuxConfig {
    /// Load configuration from an optional file path plus the environment.
    ///
    /// Environment variables use the `CALLMUX_` prefix with `__` separating
    /// nested fields, e.g. `CALLMUX_BATCH__MAX_BATCH_SIZE=64`.
    pub fn load(path: Option<&Path>) -> Result<Self, BatchError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: CallmuxConfig = builder
            .add_source(Environment::with_prefix("CALLMUX").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate field values before use.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.batch.max_batch_size == 0 {
            return Err(BatchError::Config(
                "batch.max_batch_size must be at least 1".to_string(),
            ));
        }

        self.default_block.parse::<BlockId>().map_err(|e| {
            BatchError::Config(format!("Invalid default_block: {}", e))
        })?;

        if let Some(url) = &self.rpc_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BatchError::Config(format!(
                    "rpc_url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }

        Ok(())
    }

    /// Parsed default execution context.
    pub fn default_block(&self) -> Result<BlockId, BatchError> {
        self.default_block
            .parse()
            .map_err(|e| BatchError::Config(format!("Invalid default_block: {}", e)))
    }

    /// Convert into engine settings.
    pub fn engine_config(&self) -> Result<EngineConfig, BatchError> {
        Ok(EngineConfig {
            max_batch_size: self.batch.max_batch_size,
            default_block: self.default_block()?,
            registry: AggregatorRegistry::default(),
        })
    }
}
