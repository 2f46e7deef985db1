//! End-to-end behavior of the operation surface over a small catalog

use super::test_utils::{fs_from_json, read_whole, WEB_CATALOG};
use dapphubfs::error::FsError;
use dapphubfs::fs::{AccessMask, EntryKind};

const CONF: &str = "/dapp@web.service.d/dapp.conf";

#[test]
fn test_root_listing() {
    let fs = fs_from_json(WEB_CATALOG);
    let names: Vec<String> = fs.list("/").unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec![".", "..", "dapp@web.service.d"]);
}

#[test]
fn test_generated_file_content() {
    let fs = fs_from_json(WEB_CATALOG);
    let text = read_whole(&fs, CONF);

    assert!(text.starts_with("#\n# Automatically generated from dApp Hub catalog\n"));
    assert!(text.contains("Description=Web app"));
    assert!(text.contains("Wants=forward-port@80-tcp.service"));
    assert!(text.contains("Environment=DAPP_DOCKER_PORTS=\"-p80/tcp\""));
    assert!(text.contains("Environment=DAPP_DOCKER_IMAGE=org/web:1"));
    assert!(text.contains(
        "Environment=DAPP_DOCKER_IMAGE_FILE=/var/lib/docker/preinstall/org_web_1.tar"
    ));
    assert!(text.ends_with("\n\n"));
}

#[test]
fn test_size_matches_content() {
    let fs = fs_from_json(WEB_CATALOG);
    let attr = fs.attributes(CONF).unwrap();
    assert_eq!(attr.kind, EntryKind::File);
    assert_eq!(attr.size as usize, read_whole(&fs, CONF).len());
}

#[test]
fn test_public_and_private_ports() {
    let fs = fs_from_json(
        r#"[{
            "name": "api",
            "description": "API",
            "image": "api:2",
            "ports": [
                {"port": 80, "protocol": "tcp", "type": "public"},
                {"port": 443, "protocol": "tcp", "type": "private"}
            ]
        }]"#,
    );
    let text = read_whole(&fs, "/dapp@api.service.d/dapp.conf");
    assert_eq!(text.matches("Wants=forward-port@80-tcp.service").count(), 1);
    assert!(!text.contains("Wants=forward-port@443"));
    assert!(text.contains("-p80/tcp"));
    assert!(text.contains("-p443/tcp"));
}

#[test]
fn test_chunked_reads_reassemble() {
    let fs = fs_from_json(WEB_CATALOG);
    let expected = read_whole(&fs, CONF);

    let fh = fs.open(CONF, libc::O_RDONLY).unwrap();
    let mut assembled = Vec::new();
    let mut offset = 0u64;
    loop {
        let chunk = fs.read(CONF, fh, offset, 7).unwrap();
        if chunk.is_empty() {
            break;
        }
        offset += chunk.len() as u64;
        assembled.extend(chunk);
    }
    fs.release(CONF, fh).unwrap();

    assert_eq!(String::from_utf8(assembled).unwrap(), expected);
}

#[test]
fn test_read_past_end_and_after_release() {
    let fs = fs_from_json(WEB_CATALOG);
    let size = fs.attributes(CONF).unwrap().size;
    let fh = fs.open(CONF, libc::O_RDONLY).unwrap();

    assert!(fs.read(CONF, fh, size, 10).unwrap().is_empty());
    fs.release(CONF, fh).unwrap();
    assert_eq!(fs.read(CONF, fh, 0, 10), Err(FsError::InvalidHandle(fh.0)));
}

#[test]
fn test_write_access_denied_everywhere() {
    let fs = fs_from_json(WEB_CATALOG);
    for path in ["/", "/dapp@web.service.d", "/dapp@other.service.d", CONF] {
        assert!(matches!(
            fs.check_access(path, AccessMask::WRITE),
            Err(FsError::PermissionDenied(_))
        ));
    }
}

#[test]
fn test_unknown_entity_directory_lists_but_file_is_missing() {
    let fs = fs_from_json(WEB_CATALOG);
    let names: Vec<String> = fs
        .list("/dapp@ghost.service.d")
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec![".", "..", "dapp.conf"]);
    assert!(matches!(
        fs.attributes("/dapp@ghost.service.d/dapp.conf"),
        Err(FsError::NotFound(_))
    ));
}

#[test]
fn test_content_rendered_once() {
    let fs = fs_from_json(WEB_CATALOG);
    fs.attributes(CONF).unwrap();
    read_whole(&fs, CONF);
    read_whole(&fs, CONF);
    assert_eq!(fs.cache().render_count(), 1);
}
