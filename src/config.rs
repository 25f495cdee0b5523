//! # Tracker Configuration
//!
//! Settings for [`ModuleLifecycleTracker`](crate::tracker::ModuleLifecycleTracker),
//! loaded from an optional file plus `CONNECTOR_REGISTRY_*` environment
//! variables, with the environment taking precedence.
//!
//! ```toml
//! # connector-registry.toml
//! resource_path = "META-INF/services/connector.transport.ExecutorService"
//! purge_on_stop = true
//! log_contributions = false
//! ```

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CONNECTOR_REGISTRY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Declaration resource inside each module; derived from the capability when unset
    pub resource_path: Option<String>,
    /// Withdraw this tracker's contributions from the shared registry on stop
    pub purge_on_stop: bool,
    /// Emit an info-level record for every contribution and withdrawal
    pub log_contributions: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            resource_path: None,
            purge_on_stop: true,
            log_contributions: true,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `CONNECTOR_REGISTRY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::load_from(None, ENV_PREFIX)
    }

    /// Load a configuration file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_from(Some(path.as_ref()), ENV_PREFIX)
    }

    /// Load from an optional file and an explicit environment prefix
    pub fn load_from(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            if !path.is_file() {
                return Err(RegistryError::Configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(::config::File::from(path));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(env_prefix).try_parsing(true),
        );

        let config: TrackerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            resource_path = ?config.resource_path,
            purge_on_stop = config.purge_on_stop,
            log_contributions = config.log_contributions,
            "Tracker configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.resource_path {
            if path.trim().is_empty() {
                return Err(RegistryError::InvalidValue {
                    field: "resource_path".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            if path.split('/').any(|segment| segment == "..") {
                return Err(RegistryError::InvalidValue {
                    field: "resource_path".to_string(),
                    reason: format!("'{path}' must not leave the module root"),
                });
            }
        }
        Ok(())
    }
}
