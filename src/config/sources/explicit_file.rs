//! Config file passed on the command line.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Add `path` as a required TOML source.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(true)))
}
