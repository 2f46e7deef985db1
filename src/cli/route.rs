//! CLI route: run context built from configuration; dispatches to check or mount.

use crate::catalog::Catalog;
use crate::cli::output::format_check_report;
use crate::cli::parse::Cli;
use crate::config::{ConfigLoader, DappHubConfig};
use crate::error::{ApiError, FsError};
use crate::fs::DappFs;
use crate::fuse;
use crate::render::render_unit;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of rendering every entry of a catalog
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Name and rendered size of each well-formed entry
    pub rendered: Vec<(String, usize)>,
    pub malformed: Vec<FsError>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.malformed.is_empty()
    }
}

/// Render every entry once, collecting failures instead of stopping at the first.
pub fn check_catalog(catalog: &Catalog) -> CheckReport {
    let mut report = CheckReport::default();
    for dapp in catalog.iter() {
        match render_unit(dapp) {
            Ok(conf) => report.rendered.push((dapp.name.clone(), conf.len())),
            Err(e) => {
                warn!(name = %dapp.name, error = %e, "Malformed catalog entry");
                report.malformed.push(e);
            }
        }
    }
    report
}

/// Runtime context for CLI execution
pub struct RunContext {
    config: DappHubConfig,
}

impl RunContext {
    /// Load configuration from `config_path`, or from the default sources.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: DappHubConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DappHubConfig {
        &self.config
    }

    /// Run the command line: check the catalog, or mount it and block.
    pub fn execute(&self, cli: &Cli) -> Result<String, ApiError> {
        let catalog = Catalog::load_from_file(&cli.catalog)?;
        info!(
            catalog = %cli.catalog.display(),
            entries = catalog.len(),
            "Catalog loaded"
        );

        if cli.check {
            let report = check_catalog(&catalog);
            let text = format_check_report(&report);
            return if report.is_ok() {
                Ok(text)
            } else {
                Err(ApiError::CheckFailed(text))
            };
        }

        let mountpoint = cli.mountpoint.as_ref().ok_or_else(|| {
            ApiError::ConfigError("a mountpoint is required unless --check is given".to_string())
        })?;

        let mut mount_config = self.config.mount.clone();
        if cli.allow_other {
            mount_config.allow_other = true;
        }

        fuse::mount(DappFs::new(catalog), mountpoint, &mount_config)?;
        Ok(format!("Unmounted {}", mountpoint.display()))
    }
}
