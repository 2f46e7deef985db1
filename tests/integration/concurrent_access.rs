//! Handles and cache under concurrent use

use super::test_utils::{fs_from_json, read_whole, WEB_CATALOG};
use std::sync::Arc;
use std::thread;

const CONF: &str = "/dapp@web.service.d/dapp.conf";

#[test]
fn test_two_opens_are_independent() {
    let fs = fs_from_json(WEB_CATALOG);
    let expected = read_whole(&fs, CONF).into_bytes();

    let a = fs.open(CONF, libc::O_RDONLY).unwrap();
    let b = fs.open(CONF, libc::O_RDONLY).unwrap();
    assert_ne!(a, b);

    fs.release(CONF, a).unwrap();
    assert_eq!(fs.read(CONF, b, 0, u32::MAX).unwrap(), expected);
    fs.release(CONF, b).unwrap();
    assert_eq!(fs.handles().open_count(), 0);
}

#[test]
fn test_parallel_open_read_release() {
    let fs = Arc::new(fs_from_json(WEB_CATALOG));
    let expected = Arc::new(read_whole(&fs, CONF).into_bytes());

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let fs = Arc::clone(&fs);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                let mut handles = Vec::new();
                for _ in 0..50 {
                    let fh = fs.open(CONF, libc::O_RDONLY).unwrap();
                    assert_eq!(fs.read(CONF, fh, 0, u32::MAX).unwrap(), *expected);
                    handles.push(fh);
                }
                for fh in &handles {
                    fs.release(CONF, *fh).unwrap();
                }
                handles
            })
        })
        .collect();

    let mut all = Vec::new();
    for worker in workers {
        all.extend(worker.join().unwrap());
    }
    let total = all.len();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), total, "every open must get a distinct handle");
    assert_eq!(fs.handles().open_count(), 0);
    assert_eq!(fs.cache().render_count(), 1);
}
