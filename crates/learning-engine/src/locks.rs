//! Per-key mutual exclusion.
//!
//! Read-modify-write cycles on one progress key or one enrollment must not
//! interleave, but unrelated keys should never wait on each other. A
//! [`KeyedLocks`] hands out one mutex per key and drops it once nobody holds
//! or waits on it.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// A lazily populated table of per-key mutexes.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// A panic in another holder does not poison the key: the guarded data
    /// is `()`, and the records it protects live in the store.
    pub fn with_lock<R>(&self, key: &K, f: impl FnOnce() -> R) -> R {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let result = {
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Map entry plus ours: nobody else is holding or waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        result
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
