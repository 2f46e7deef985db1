//! Path classification for the virtual tree.
//!
//! ```text
//! /                                   root directory
//! /dapp@<name>.service.d              entity directory
//! /dapp@<name>.service.d/dapp.conf    generated unit drop-in
//! ```

use crate::catalog::Catalog;
use regex::Regex;
use std::sync::LazyLock;

/// Name of the single file inside every entity directory
pub const CONF_FILE_NAME: &str = "dapp.conf";

static ENTITY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/dapp@([A-Za-z0-9_-]+)\.service\.d(/.*)?$").expect("static regex is valid")
});

static ENTITY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex is valid"));

/// What a path resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathClass {
    Invalid,
    /// Root or an entity directory
    Directory,
    /// The generated file of the named entity
    EntityFile(String),
}

impl PathClass {
    pub fn is_dir(&self) -> bool {
        matches!(self, PathClass::Directory)
    }
}

/// Classify `path` against the catalog.
///
/// Entity directories resolve whether or not the name is in the catalog; only
/// the file inside requires catalog membership.
pub fn classify(path: &str, catalog: &Catalog) -> PathClass {
    if path == "/" {
        return PathClass::Directory;
    }

    let Some(caps) = ENTITY_PATH.captures(path) else {
        return PathClass::Invalid;
    };
    let name = &caps[1];

    let Some(file) = caps.get(2) else {
        return PathClass::Directory;
    };

    if !catalog.contains(name) {
        return PathClass::Invalid;
    }

    if file.as_str() == format!("/{CONF_FILE_NAME}") {
        PathClass::EntityFile(name.to_string())
    } else {
        PathClass::Invalid
    }
}

/// Directory name synthesized for an entity
pub fn entity_dir_name(name: &str) -> String {
    format!("dapp@{name}.service.d")
}

/// Whether `name` is usable as an entity name inside a path
pub fn is_valid_name(name: &str) -> bool {
    ENTITY_NAME.is_match(name)
}
