//! Populate-once cells for per-category query results

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::hardware::Category;

/// Lazily populated, mutex-guarded result for one hardware category.
///
/// The lock is held while the populator runs, so concurrent first callers
/// see exactly one probe. A failed populator leaves the cell empty and the
/// next caller tries again; a successful one is kept until [`invalidate`]
/// even when it found nothing.
///
/// [`invalidate`]: SnapshotCell::invalidate
pub struct SnapshotCell<T> {
    category: Category,
    value: Mutex<Option<Arc<T>>>,
}

impl<T> SnapshotCell<T> {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            value: Mutex::new(None),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Return the cached value, running `populate` first if the cell is empty
    pub fn get_or_populate<E, F>(&self, populate: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut slot = self.value.lock();
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(populate()?);
        debug!(category = %self.category, "populated snapshot cache");
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Drop the cached value. The next read probes again.
    pub fn invalidate(&self) {
        if self.value.lock().take().is_some() {
            debug!(category = %self.category, "invalidated snapshot cache");
        }
    }

    pub fn is_populated(&self) -> bool {
        self.value.lock().is_some()
    }
}
