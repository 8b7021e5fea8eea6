//! Per-package mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;

type LockMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Process-local async locks keyed by canonical package name.
///
/// Two calls for the same package run one after the other; calls for
/// different packages do not block each other. An entry lives only while
/// some caller holds or waits for it.
#[derive(Debug, Default)]
pub struct NameLocks {
    locks: Mutex<LockMap>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, name: &str) -> NameGuard<'_> {
        let lock = self
            .map()
            .entry(name.to_string())
            .or_default()
            .clone();
        NameGuard {
            guard: Some(lock.lock_owned().await),
            name: name.to_string(),
            locks: self,
        }
    }

    /// Number of names currently held or waited on.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Held lock for one name. Dropping it releases the name and forgets the
/// entry once nobody else is waiting.
#[derive(Debug)]
pub struct NameGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    name: String,
    locks: &'a NameLocks,
}

impl Drop for NameGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.map();
        // Waiters clone the Arc under the map lock, so a count of one means
        // only the map still refers to it.
        if map
            .get(&self.name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.name);
        }
    }
}
