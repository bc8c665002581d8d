use std::collections::HashMap;

use super::{WindowId, WindowState};

/// Side table of per-window bookkeeping keyed by window id.
///
/// Entries are only ever removed through [`StateStore::remove`] or
/// [`StateStore::drain`], driven by lifecycle events; nothing here keeps a
/// platform window alive.
#[derive(Debug, Default)]
pub struct StateStore {
    windows: HashMap<WindowId, WindowState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    pub fn contains(&self, window_id: WindowId) -> bool {
        self.windows.contains_key(&window_id)
    }

    pub fn get(&self, window_id: WindowId) -> Option<&WindowState> {
        self.windows.get(&window_id)
    }

    pub fn get_mut(&mut self, window_id: WindowId) -> Option<&mut WindowState> {
        self.windows.get_mut(&window_id)
    }

    /// Returns false (and keeps the existing entry) if the window is already tracked.
    pub fn insert(&mut self, window_id: WindowId, state: WindowState) -> bool {
        if self.windows.contains_key(&window_id) {
            return false;
        }
        self.windows.insert(window_id, state);
        true
    }

    pub fn remove(&mut self, window_id: WindowId) -> Option<WindowState> {
        self.windows.remove(&window_id)
    }

    /// Tracked window ids in ascending order.
    pub fn ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self.windows.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Removes every entry, in ascending id order.
    pub fn drain(&mut self) -> Vec<(WindowId, WindowState)> {
        let mut entries: Vec<(WindowId, WindowState)> = self.windows.drain().collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn owned_count(&self) -> usize {
        self.windows.values().filter(|s| s.owns_behavior).count()
    }
}
