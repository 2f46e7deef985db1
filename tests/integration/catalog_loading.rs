//! Loading catalogs from disk

use super::test_utils::write_catalog;
use dapphubfs::catalog::Catalog;
use dapphubfs::error::{CatalogError, FsError};
use dapphubfs::fs::DappFs;
use tempfile::TempDir;

#[test]
fn test_load_and_mount_order() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(
        &dir,
        r#"[
            {"name": "zeta", "description": "Z", "image": "z:1", "ports": []},
            {"name": "alpha", "description": "A", "image": "a:1", "ports": []},
            {"name": "zeta", "description": "Z2", "image": "z:2", "ports": []}
        ]"#,
    );

    let fs = DappFs::new(Catalog::load_from_file(&path).unwrap());
    let names: Vec<String> = fs.list("/").unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(
        names,
        vec![".", "..", "dapp@zeta.service.d", "dapp@alpha.service.d"]
    );

    let fh = fs
        .open("/dapp@zeta.service.d/dapp.conf", libc::O_RDONLY)
        .unwrap();
    let text = String::from_utf8(
        fs.read("/dapp@zeta.service.d/dapp.conf", fh, 0, u32::MAX)
            .unwrap(),
    )
    .unwrap();
    assert!(text.contains("Description=Z2\n"));
}

#[test]
fn test_invalid_json_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, "[{\"name\": ");
    assert!(matches!(
        Catalog::load_from_file(&path),
        Err(CatalogError::Parse(_))
    ));
}

#[test]
fn test_empty_catalog_mounts_empty_root() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, "[]");
    let fs = DappFs::new(Catalog::load_from_file(&path).unwrap());
    assert_eq!(fs.list("/").unwrap().len(), 2);
}

#[test]
fn test_bad_port_record_spares_its_siblings() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(
        &dir,
        r#"[
            {"name": "web", "description": "Web app", "image": "org/web:1",
             "ports": [{"port": 80, "protocol": "tcp", "type": "public"}]},
            {"name": "bad", "description": "Bad", "image": "bad:1",
             "ports": [{"port": "8080", "protocol": "tcp", "type": "public"}]},
            {"name": "huge", "description": "Huge", "image": "huge:1",
             "ports": [{"port": 70000, "protocol": "udp", "type": "private"}]}
        ]"#,
    );

    let fs = DappFs::new(Catalog::load_from_file(&path).unwrap());
    let names: Vec<String> = fs.list("/").unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(
        names,
        vec![
            ".",
            "..",
            "dapp@web.service.d",
            "dapp@bad.service.d",
            "dapp@huge.service.d"
        ]
    );

    let conf = "/dapp@web.service.d/dapp.conf";
    let fh = fs.open(conf, libc::O_RDONLY).unwrap();
    let text = String::from_utf8(fs.read(conf, fh, 0, u32::MAX).unwrap()).unwrap();
    assert!(text.contains("Wants=forward-port@80-tcp.service\n"));

    for conf in [
        "/dapp@bad.service.d/dapp.conf",
        "/dapp@huge.service.d/dapp.conf",
    ] {
        let err = fs.open(conf, libc::O_RDONLY).unwrap_err();
        assert!(matches!(err, FsError::MalformedEntity { .. }), "{conf}: {err:?}");
        assert_eq!(err.errno(), libc::EIO);
    }
}
