//! Global config file source: $XDG_CONFIG_HOME/dapphubfs/config.toml or ~/.config/dapphubfs/config.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::PathBuf;
use tracing::debug;

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("dapphubfs").join("config.toml"))
}

/// Add global config file source to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match global_config_path() {
        Some(path) if path.exists() => {
            debug!(config_path = %path.display(), "Using global configuration file");
            Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(false)))
        }
        _ => Ok(builder),
    }
}
