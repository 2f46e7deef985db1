//! Content cache: memoized unit text per dApp name.
//!
//! Entries are never evicted or regenerated. The catalog is load-once, so a
//! rendered unit stays valid for the life of the process.

use crate::catalog::Catalog;
use crate::error::FsError;
use crate::render::render_unit;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

type Slot = Arc<Mutex<Option<Arc<str>>>>;

/// Thread-safe, single-flight cache of rendered units.
///
/// Concurrent callers for the same name serialize on that name's slot, so the
/// generator runs at most once per name and every caller sees the same string.
/// Callers for different names only share the brief slot lookup.
pub struct ContentCache {
    catalog: Arc<Catalog>,
    slots: Mutex<HashMap<String, Slot>>,
    renders: AtomicU64,
}

impl ContentCache {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            slots: Mutex::new(HashMap::new()),
            renders: AtomicU64::new(0),
        }
    }

    /// Return the rendered unit for `name`, generating it on first use.
    ///
    /// A failed generation is not cached; the next call tries again (and, the
    /// renderer being deterministic, fails the same way).
    pub fn get_or_render(&self, name: &str) -> Result<Arc<str>, FsError> {
        let dapp = self
            .catalog
            .get(name)
            .ok_or_else(|| FsError::not_found(name))?;

        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(name.to_string()).or_default())
        };

        let mut content = slot.lock();
        if let Some(cached) = content.as_ref() {
            trace!(name, "Content cache hit");
            return Ok(Arc::clone(cached));
        }

        let rendered: Arc<str> = render_unit(dapp)?.into();
        self.renders.fetch_add(1, Ordering::Relaxed);
        debug!(name, bytes = rendered.len(), "Rendered unit");

        *content = Some(Arc::clone(&rendered));
        Ok(rendered)
    }

    /// Number of names with rendered content
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times the generator has produced content
    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }
}
