//! Shared test utilities for integration tests

use dapphubfs::catalog::Catalog;
use dapphubfs::fs::DappFs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Catalog used by the scenario tests: one public web app
pub const WEB_CATALOG: &str = r#"[
    {
        "name": "web",
        "description": "Web app",
        "image": "org/web:1",
        "ports": [{"port": 80, "protocol": "tcp", "type": "public"}]
    }
]"#;

/// Write `json` to `catalog.json` inside `dir` and return its path
pub fn write_catalog(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, json).unwrap();
    path
}

/// Filesystem over a catalog parsed from `json`
pub fn fs_from_json(json: &str) -> DappFs {
    DappFs::new(Catalog::from_json_str(json).unwrap())
}

/// Read the whole file at `path` through open/read/release
pub fn read_whole(fs: &DappFs, path: &str) -> String {
    let fh = fs.open(path, libc::O_RDONLY).unwrap();
    let data = fs.read(path, fh, 0, u32::MAX).unwrap();
    fs.release(path, fh).unwrap();
    String::from_utf8(data).unwrap()
}
