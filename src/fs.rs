//! Filesystem operation surface
//!
//! Path-based operations composed from the classifier, the content cache and
//! the handle table. The FUSE binding in [`crate::fuse`] translates kernel
//! requests into these calls; everything here is transport-independent.

use crate::cache::ContentCache;
use crate::catalog::Catalog;
use crate::error::FsError;
use crate::handles::{FileHandle, HandleTable};
use crate::path::{classify, entity_dir_name, PathClass, CONF_FILE_NAME};
use bitflags::bitflags;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Permission bits of every directory
pub const DIR_PERM: u16 = 0o755;
/// Permission bits of every generated file
pub const FILE_PERM: u16 = 0o644;

bitflags! {
    /// Access intent of an `access(2)` request
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessMask: i32 {
        const READ = libc::R_OK;
        const WRITE = libc::W_OK;
        const EXECUTE = libc::X_OK;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// Metadata reported for a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryAttr {
    pub kind: EntryKind,
    pub size: u64,
    pub perm: u16,
    pub nlink: u32,
}

impl EntryAttr {
    fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            perm: DIR_PERM,
            nlink: 2,
        }
    }

    fn file(size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            perm: FILE_PERM,
            nlink: 1,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// One directory listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The read-only dApp Hub filesystem
pub struct DappFs {
    catalog: Arc<Catalog>,
    cache: ContentCache,
    handles: HandleTable,
}

impl DappFs {
    pub fn new(catalog: Catalog) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            cache: ContentCache::new(Arc::clone(&catalog)),
            catalog,
            handles: HandleTable::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Classify `path`, mapping `Invalid` to `NotFound`
    fn resolve(&self, path: &str) -> Result<PathClass, FsError> {
        match classify(path, &self.catalog) {
            PathClass::Invalid => Err(FsError::not_found(path)),
            class => Ok(class),
        }
    }

    /// Rendered content of the file at `path`
    pub fn content(&self, path: &str) -> Result<Arc<str>, FsError> {
        match self.resolve(path)? {
            PathClass::EntityFile(name) => self.cache.get_or_render(&name),
            _ => Err(FsError::is_a_directory(path)),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn attributes(&self, path: &str) -> Result<EntryAttr, FsError> {
        let attr = match self.resolve(path)? {
            PathClass::EntityFile(name) => {
                EntryAttr::file(self.cache.get_or_render(&name)?.len() as u64)
            }
            _ => EntryAttr::directory(),
        };
        trace!(kind = ?attr.kind, size = attr.size, "getattr");
        Ok(attr)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        if let PathClass::EntityFile(_) = self.resolve(path)? {
            return Err(FsError::not_a_directory(path));
        }

        let mut entries = vec![
            DirEntry::new(".", EntryKind::Directory),
            DirEntry::new("..", EntryKind::Directory),
        ];
        if path == "/" {
            entries.extend(
                self.catalog
                    .names()
                    .map(|name| DirEntry::new(entity_dir_name(name), EntryKind::Directory)),
            );
        } else {
            entries.push(DirEntry::new(CONF_FILE_NAME, EntryKind::File));
        }
        trace!(count = entries.len(), "readdir");
        Ok(entries)
    }

    /// Read-only policy: writes are never allowed; execute only on directories.
    #[instrument(level = "debug", skip(self))]
    pub fn check_access(&self, path: &str, mask: AccessMask) -> Result<(), FsError> {
        let class = self.resolve(path)?;
        if mask.contains(AccessMask::WRITE) {
            return Err(FsError::permission_denied(path));
        }
        if mask.contains(AccessMask::EXECUTE) && !class.is_dir() {
            return Err(FsError::permission_denied(path));
        }
        Ok(())
    }

    /// Open the file at `path` for reading and capture its content.
    ///
    /// Directories are rejected with `IsADirectory`; any write intent in
    /// `flags` is rejected with `PermissionDenied`.
    #[instrument(level = "debug", skip(self))]
    pub fn open(&self, path: &str, flags: i32) -> Result<FileHandle, FsError> {
        let name = match self.resolve(path)? {
            PathClass::EntityFile(name) => name,
            _ => return Err(FsError::is_a_directory(path)),
        };
        if flags & libc::O_ACCMODE != libc::O_RDONLY || flags & libc::O_TRUNC != 0 {
            return Err(FsError::permission_denied(path));
        }

        let content = self.cache.get_or_render(&name)?;
        let fh = self.handles.allocate(content)?;
        debug!(handle = fh.0, "Opened");
        Ok(fh)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn read(
        &self,
        path: &str,
        fh: FileHandle,
        offset: u64,
        size: u32,
    ) -> Result<Vec<u8>, FsError> {
        self.handles.read(fh, offset, size)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn release(&self, path: &str, fh: FileHandle) -> Result<(), FsError> {
        self.handles.release(fh)
    }

    /// Nothing is ever written, so there is nothing to flush.
    pub fn sync(&self) -> Result<(), FsError> {
        Ok(())
    }
}
