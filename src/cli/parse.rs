//! CLI parse: clap types for dapphubfs. No behavior; definitions only.

use clap::Parser;
use std::path::PathBuf;

/// dapphubfs - dApp Hub catalog as a read-only filesystem
#[derive(Parser, Debug)]
#[command(name = "dapphubfs")]
#[command(about = "Mount a dApp Hub catalog as read-only systemd unit drop-ins")]
#[command(version)]
pub struct Cli {
    /// Path to the catalog JSON file
    pub catalog: PathBuf,

    /// Directory to mount the filesystem on
    #[arg(required_unless_present = "check")]
    pub mountpoint: Option<PathBuf>,

    /// Render every catalog entry, report malformed ones, and exit without mounting
    #[arg(long)]
    pub check: bool,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Allow other users to access the mount
    #[arg(long)]
    pub allow_other: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
