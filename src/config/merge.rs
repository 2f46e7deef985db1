//! Merge rules: defaults and override order.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("mount.fs_name", "dapphub")?
        .set_default("mount.auto_unmount", false)?
        .set_default("mount.allow_other", false)?
        .set_default("mount.ttl_secs", 1)
}
