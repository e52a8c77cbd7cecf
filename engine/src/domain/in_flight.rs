//! Suppression of duplicate in-flight requests.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Keys of requests currently being processed.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    keys: Mutex<HashSet<String>>,
}

impl InFlightRegistry {
    /// Claim `key`, or `None` when a request with the same key is
    /// outstanding. The claim is released when the guard drops.
    pub fn try_begin(&self, key: String) -> Option<InFlightGuard<'_>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if keys.insert(key.clone()) {
            Some(InFlightGuard { registry: self, key })
        } else {
            None
        }
    }
}

/// Claim on an in-flight key.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    registry: &'a InFlightRegistry,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
