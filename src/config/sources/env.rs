//! Environment overrides: `DAPPHUBFS__MOUNT__ALLOW_OTHER=true` sets `mount.allow_other`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const ENV_PREFIX: &str = "DAPPHUBFS";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    )
}
