//! Engine configuration
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. Config file (`--config`, `BLOCKSTAGE_CONFIG_PATH`, or `./blockstage.toml` if present)
//! 3. `BLOCKSTAGE_*` environment variables
//! 4. Explicit builder overrides

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::Result;

const DEFAULT_CONFIG_FILE: &str = "blockstage";
const ENV_PREFIX: &str = "BLOCKSTAGE";
const CONFIG_PATH_VAR: &str = "BLOCKSTAGE_CONFIG_PATH";

/// How start-block chains are scheduled within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheduling {
    /// Drain each start chain to completion before the next one begins
    #[default]
    Sequential,
    /// Every start chain runs as its own cooperative task
    Concurrent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tween frame cadence in milliseconds
    pub frame_interval_ms: u64,
    pub scheduling: Scheduling,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            scheduling: Scheduling::Sequential,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from the default file and environment
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/* ===================== Builder ===================== */

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    scheduling: Option<Scheduling>,
    frame_interval_ms: Option<u64>,
}

impl ConfigBuilder {
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn scheduling(mut self, scheduling: Option<Scheduling>) -> Self {
        self.scheduling = scheduling;
        self
    }

    pub fn frame_interval_ms(mut self, millis: Option<u64>) -> Self {
        self.frame_interval_ms = millis;
        self
    }

    pub fn build(self) -> Result<EngineConfig> {
        let path = self
            .config_path
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));

        let builder = config::Config::builder();
        let builder = match path {
            // An explicitly named file must exist
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let mut resolved: EngineConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        if let Some(scheduling) = self.scheduling {
            resolved.scheduling = scheduling;
        }
        if let Some(millis) = self.frame_interval_ms {
            resolved.frame_interval_ms = millis;
        }

        Ok(resolved)
    }
}
