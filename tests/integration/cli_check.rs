//! Binary behavior that does not need a FUSE mount

use super::test_utils::{write_catalog, WEB_CATALOG};
use std::process::Command;
use tempfile::TempDir;

fn dapphubfs() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dapphubfs"));
    cmd.env_remove("DAPPHUBFS_LOG").arg("--quiet");
    cmd
}

#[test]
fn test_missing_arguments_print_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_dapphubfs"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr={stderr}");
}

#[test]
fn test_check_valid_catalog() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, WEB_CATALOG);

    let output = dapphubfs().arg("--check").arg(&catalog).output().unwrap();
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok        web"));
    assert!(stdout.contains("1 entries, 1 ok, 0 malformed"));
}

#[test]
fn test_check_malformed_catalog_fails() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(&dir, r#"[{"name": "web", "description": "Web"}]"#);

    let output = dapphubfs().arg("--check").arg(&catalog).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed"), "stderr={stderr}");
}
