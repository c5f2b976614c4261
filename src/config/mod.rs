//! # Configuration
//!
//! Layered configuration for the batch engine: a base YAML file, an optional
//! per-environment override file, and `BATCH__`-prefixed environment variables.
//!
//! ```yaml
//! execution:
//!   batch_size: 100
//!   working_directory_prefix: "batch_"
//! events:
//!   channel_capacity: 1000
//! logging:
//!   json: false
//! ```

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub execution: ExecutionConfig,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

/// Step and job execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Items buffered before each write
    pub batch_size: usize,
    /// Parent of per-run working directories, system temp dir when unset
    pub working_directory_root: Option<PathBuf>,
    pub working_directory_prefix: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            working_directory_root: None,
            working_directory_prefix: defaults::WORKING_DIRECTORY_PREFIX.to_string(),
        }
    }
}

impl ExecutionConfig {
    /// Directory under which working directories are created
    pub fn working_directory_root(&self) -> PathBuf {
        self.working_directory_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, environment default when unset
    pub level: Option<String>,
    pub json: bool,
}

impl BatchConfig {
    /// Validate value ranges that serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.execution.batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "execution.batch_size",
                "0",
                "batch size must be at least 1",
            ));
        }

        if self.execution.working_directory_prefix.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "execution.working_directory_prefix",
                self.execution.working_directory_prefix.clone(),
                "prefix must not be empty",
            ));
        }

        if self.execution.working_directory_prefix.contains(['/', '\\']) {
            return Err(ConfigurationError::invalid_value(
                "execution.working_directory_prefix",
                self.execution.working_directory_prefix.clone(),
                "prefix must not contain path separators",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                "0",
                "channel capacity must be at least 1",
            ));
        }

        if let Some(root) = &self.execution.working_directory_root {
            if root.as_os_str().is_empty() {
                return Err(ConfigurationError::validation_error(
                    "execution.working_directory_root must not be empty when set",
                ));
            }
        }

        Ok(())
    }
}
