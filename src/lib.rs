//! dapphubfs: a dApp Hub catalog as a read-only filesystem
//!
//! Every catalog entry appears as a `dapp@<name>.service.d` directory holding a
//! single generated `dapp.conf` systemd drop-in. Nothing is stored on disk; the
//! file content is rendered from the catalog on first access and cached for the
//! life of the process.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod fuse;
pub mod handles;
pub mod logging;
pub mod path;
pub mod render;
