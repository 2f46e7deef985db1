//! Open file handles.
//!
//! Each `open` captures the rendered content into its own handle, so reads
//! through that handle never observe a later change to the cache.
//!
//! Handles on different keys never contend. Calling `release` concurrently with
//! an in-flight `read` of the *same* handle is a caller contract violation; the
//! kernel does not issue these concurrently for a single open file.

use crate::error::FsError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, trace};

/// Opaque identifier of one open read session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileHandle(pub u64);

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Table of live handles, allocated from a monotonically increasing counter
pub struct HandleTable {
    next: AtomicU64,
    open: DashMap<FileHandle, Arc<str>>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start allocating at `first`
    pub(crate) fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
            open: DashMap::new(),
        }
    }

    /// Store `content` under a fresh handle.
    ///
    /// # Panics
    ///
    /// Panics if the fresh handle is already live. Handles are never reused, so
    /// this can only mean the counter logic is broken.
    pub fn allocate(&self, content: Arc<str>) -> Result<FileHandle, FsError> {
        let id = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .map_err(|_| FsError::ResourceExhausted)?;
        let fh = FileHandle(id);

        match self.open.entry(fh) {
            Entry::Occupied(_) => {
                error!(handle = id, "File handle collision");
                panic!("invariant violated: file handle {id} allocated while still open");
            }
            Entry::Vacant(slot) => {
                slot.insert(content);
            }
        }

        trace!(handle = id, "Allocated file handle");
        Ok(fh)
    }

    /// Bytes `[offset, offset + size)` of the handle's content, clipped to its
    /// length. Reading at or past the end yields an empty buffer.
    pub fn read(&self, fh: FileHandle, offset: u64, size: u32) -> Result<Vec<u8>, FsError> {
        let content = self
            .open
            .get(&fh)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(FsError::InvalidHandle(fh.0))?;

        let bytes = content.as_bytes();
        let len = bytes.len() as u64;
        if offset >= len {
            return Ok(Vec::new());
        }
        let end = offset.saturating_add(u64::from(size)).min(len);
        Ok(bytes[offset as usize..end as usize].to_vec())
    }

    /// Drop the handle and its content. Releasing twice is an error.
    pub fn release(&self, fh: FileHandle) -> Result<(), FsError> {
        if self.open.remove(&fh).is_none() {
            return Err(FsError::InvalidHandle(fh.0));
        }
        trace!(handle = fh.0, "Released file handle");
        Ok(())
    }

    /// Number of live handles
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
