//! Configuration System
//!
//! Layered configuration built with the `config` crate. Precedence, lowest to
//! highest: built-in defaults, the global config file, an explicit `--config`
//! file, then `DAPPHUBFS__*` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DappHubConfig {
    /// FUSE mount settings
    #[serde(default)]
    pub mount: MountConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// FUSE mount settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Filesystem name shown in the mount table
    #[serde(default = "default_fs_name")]
    pub fs_name: String,

    /// Unmount automatically when the process exits
    #[serde(default)]
    pub auto_unmount: bool,

    /// Let users other than the mounting user access the tree
    #[serde(default)]
    pub allow_other: bool,

    /// Kernel attribute/entry cache lifetime, in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_fs_name() -> String {
    "dapphub".to_string()
}

fn default_ttl_secs() -> u64 {
    1
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fs_name: default_fs_name(),
            auto_unmount: false,
            allow_other: false,
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl MountConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.fs_name.trim().is_empty() {
            return Err("mount.fs_name cannot be empty".to_string());
        }
        if self.fs_name.contains(',') {
            return Err("mount.fs_name cannot contain ','".to_string());
        }
        Ok(())
    }
}

impl DappHubConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ApiError> {
        self.mount.validate().map_err(ApiError::ConfigError)?;
        self.logging.validate().map_err(ApiError::ConfigError)?;
        Ok(())
    }
}

/// Loads [`DappHubConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global config file, then the environment
    pub fn load() -> Result<DappHubConfig, ApiError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        Self::finish(builder)
    }

    /// Defaults, then `path` (which must exist), then the environment.
    /// The global config file is skipped.
    pub fn load_from_file(path: &Path) -> Result<DappHubConfig, ApiError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::explicit_file::add_to_builder(builder, path)?;
        Self::finish(builder)
    }

    /// Path of the global config file, if it can be determined
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<DappHubConfig, ApiError> {
        let builder = sources::env::add_to_builder(builder);
        let config: DappHubConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }
}
