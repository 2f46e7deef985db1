//! FUSE binding
//!
//! Adapts the path-based [`DappFs`] to the inode-based `fuser` protocol. The
//! kernel never sees a path, only the inode the table assigned to it.
//!
//! The root and every catalog path are pinned when the adapter is built. Any
//! other well-formed entity directory resolves too, so those inodes carry the
//! kernel's lookup count and are dropped again on `forget`. Inode numbers are
//! never reused.

use crate::catalog::Catalog;
use crate::config::MountConfig;
use crate::error::{ApiError, FsError};
use crate::fs::{AccessMask, DappFs, EntryAttr, EntryKind};
use crate::handles::FileHandle;
use crate::path::{entity_dir_name, CONF_FILE_NAME};
use fuser::consts::FOPEN_KEEP_CACHE;
use fuser::{
    FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, Request, FUSE_ROOT_ID,
};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, info, trace, warn};

/// Flags returned with every open handle; content never changes while mounted,
/// so the kernel may keep its page cache across opens
const OPEN_FLAGS: u32 = FOPEN_KEEP_CACHE;

/// Reported as `d_ino` for listed entries the kernel has not looked up yet
const UNRESOLVED_INO: u64 = u64::MAX;

#[derive(Debug)]
struct InodeEntry {
    path: String,
    /// Outstanding kernel lookups; ignored for pinned entries
    lookups: u64,
    pinned: bool,
}

/// Bidirectional inode <-> path mapping
#[derive(Debug)]
pub struct InodeTable {
    entries: HashMap<u64, InodeEntry>,
    inodes: HashMap<String, u64>,
    next: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    /// Table holding only the root
    pub fn new() -> Self {
        let mut table = Self {
            entries: HashMap::new(),
            inodes: HashMap::new(),
            next: FUSE_ROOT_ID,
        };
        table.pin("/");
        table
    }

    /// Table with the root and every path of `catalog` pinned
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let mut table = Self::new();
        for name in catalog.names() {
            let dir = format!("/{}", entity_dir_name(name));
            table.pin(&dir);
            table.pin(&format!("{dir}/{CONF_FILE_NAME}"));
        }
        table
    }

    fn insert(&mut self, path: &str, pinned: bool) -> u64 {
        let ino = self.next;
        self.next += 1;
        self.entries.insert(
            ino,
            InodeEntry {
                path: path.to_string(),
                lookups: 0,
                pinned,
            },
        );
        self.inodes.insert(path.to_string(), ino);
        ino
    }

    /// Pin `path` for the lifetime of the mount
    pub fn pin(&mut self, path: &str) -> u64 {
        match self.inodes.get(path) {
            Some(&ino) => {
                if let Some(entry) = self.entries.get_mut(&ino) {
                    entry.pinned = true;
                }
                ino
            }
            None => self.insert(path, true),
        }
    }

    pub fn path(&self, ino: u64) -> Option<&str> {
        self.entries.get(&ino).map(|e| e.path.as_str())
    }

    /// Inode already assigned to `path`, without assigning one
    pub fn get(&self, path: &str) -> Option<u64> {
        self.inodes.get(path).copied()
    }

    /// Inode for `path` after a successful kernel lookup, assigning a fresh one
    /// on first sight. Each call must be balanced by a later [`forget`].
    ///
    /// [`forget`]: InodeTable::forget
    pub fn lookup(&mut self, path: &str) -> u64 {
        let ino = match self.inodes.get(path) {
            Some(&ino) => ino,
            None => self.insert(path, false),
        };
        if let Some(entry) = self.entries.get_mut(&ino) {
            entry.lookups += 1;
        }
        ino
    }

    /// Drop `nlookup` kernel references to `ino`; an unpinned inode with none
    /// left is removed. Returns whether it was removed.
    pub fn forget(&mut self, ino: u64, nlookup: u64) -> bool {
        let Some(entry) = self.entries.get_mut(&ino) else {
            return false;
        };
        entry.lookups = entry.lookups.saturating_sub(nlookup);
        if entry.pinned || entry.lookups > 0 {
            return false;
        }
        if let Some(entry) = self.entries.remove(&ino) {
            self.inodes.remove(&entry.path);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Path of `name` inside the directory at `parent`
pub fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Parent directory of `path`; the root is its own parent
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

/// `fuser` adapter over [`DappFs`]
pub struct DappHubFuse {
    fs: DappFs,
    inodes: InodeTable,
    ttl: Duration,
}

impl DappHubFuse {
    pub fn new(fs: DappFs, ttl: Duration) -> Self {
        Self {
            inodes: InodeTable::for_catalog(fs.catalog()),
            fs,
            ttl,
        }
    }

    fn path_of(&self, ino: u64) -> Result<String, FsError> {
        self.inodes
            .path(ino)
            .map(str::to_string)
            .ok_or_else(|| FsError::not_found(format!("inode {ino}")))
    }

    fn file_attr(ino: u64, attr: &EntryAttr) -> FileAttr {
        FileAttr {
            ino,
            size: attr.size,
            blocks: attr.size.div_ceil(512),
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            kind: file_type(attr.kind),
            perm: attr.perm,
            nlink: attr.nlink,
            uid: 0,
            gid: 0,
            rdev: 0,
            blksize: 512,
            flags: 0,
        }
    }
}

fn file_type(kind: EntryKind) -> FileType {
    match kind {
        EntryKind::Directory => FileType::Directory,
        EntryKind::File => FileType::RegularFile,
    }
}

impl Filesystem for DappHubFuse {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let result = self.path_of(parent).and_then(|parent| {
            let name = name
                .to_str()
                .ok_or_else(|| FsError::not_found(name.to_string_lossy()))?;
            let path = child_path(&parent, name);
            let attr = self.fs.attributes(&path)?;
            Ok((path, attr))
        });
        match result {
            Ok((path, attr)) => {
                let ino = self.inodes.lookup(&path);
                reply.entry(&self.ttl, &Self::file_attr(ino, &attr), 0);
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        if self.inodes.forget(ino, nlookup) {
            trace!(ino, inodes = self.inodes.len(), "Evicted inode");
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        match self
            .path_of(ino)
            .and_then(|path| self.fs.attributes(&path))
        {
            Ok(attr) => reply.attr(&self.ttl, &Self::file_attr(ino, &attr)),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(e) => return reply.error(e.errno()),
        };
        let entries = match self.fs.list(&path) {
            Ok(entries) => entries,
            Err(e) => return reply.error(e.errno()),
        };

        let skip = usize::try_from(offset).unwrap_or(0);
        for (i, entry) in entries.iter().enumerate().skip(skip) {
            let entry_ino = match entry.name.as_str() {
                "." => ino,
                ".." => self.inodes.get(parent_path(&path)).unwrap_or(FUSE_ROOT_ID),
                name => self
                    .inodes
                    .get(&child_path(&path, name))
                    .unwrap_or(UNRESOLVED_INO),
            };
            if reply.add(entry_ino, (i + 1) as i64, file_type(entry.kind), &entry.name) {
                break;
            }
        }
        reply.ok();
    }

    fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        let mask = AccessMask::from_bits_truncate(mask);
        match self
            .path_of(ino)
            .and_then(|path| self.fs.check_access(&path, mask))
        {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        match self
            .path_of(ino)
            .and_then(|path| self.fs.open(&path, flags))
        {
            Ok(fh) => reply.opened(fh.0, OPEN_FLAGS),
            Err(e) => {
                if matches!(e, FsError::MalformedEntity { .. }) {
                    warn!(error = %e, "Refusing to open malformed entry");
                }
                reply.error(e.errno())
            }
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Ok(offset) = u64::try_from(offset) else {
            return reply.error(libc::EINVAL);
        };
        let path = self.inodes.path(ino).unwrap_or_default();
        match self.fs.read(path, FileHandle(fh), offset, size) {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn flush(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _lock_owner: u64,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        let path = self.inodes.path(ino).unwrap_or_default();
        match self.fs.release(path, FileHandle(fh)) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn fsync(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _datasync: bool,
        reply: ReplyEmpty,
    ) {
        match self.fs.sync() {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }
}

/// Mount options derived from configuration
pub fn mount_options(config: &MountConfig) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::RO,
        MountOption::FSName(config.fs_name.clone()),
        MountOption::Subtype("dapphubfs".to_string()),
        MountOption::NoExec,
    ];
    if config.allow_other {
        options.push(MountOption::AllowOther);
    }
    if config.auto_unmount {
        options.push(MountOption::AutoUnmount);
    }
    options
}

/// Mount `fs` at `mountpoint` and serve requests until it is unmounted.
pub fn mount(fs: DappFs, mountpoint: &Path, config: &MountConfig) -> Result<(), ApiError> {
    let options = mount_options(config);
    debug!(?options, "Mount options");
    info!(
        mountpoint = %mountpoint.display(),
        entries = fs.catalog().len(),
        "Mounting dApp Hub filesystem"
    );

    let adapter = DappHubFuse::new(fs, Duration::from_secs(config.ttl_secs));
    fuser::mount2(adapter, mountpoint, &options).map_err(|source| ApiError::Mount {
        path: mountpoint.to_path_buf(),
        source,
    })?;

    info!(mountpoint = %mountpoint.display(), "Unmounted");
    Ok(())
}
