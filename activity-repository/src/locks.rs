//! Per-chain exclusive locks.
//!
//! Every multi-link edit of a chain runs while holding that chain's lock, so
//! concurrent edits of the same stream or feed are serialized while edits of
//! independent chains proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::ChainKey;

type Registry = Mutex<HashMap<ChainKey, Arc<AsyncMutex<()>>>>;

/// Registry of one async mutex per chain.
///
/// An entry exists only while some task holds or waits for that chain's
/// lock; the last guard to drop removes it.
#[derive(Debug, Default)]
pub struct ChainLocks {
    locks: Arc<Registry>,
}

/// Proof that the holder has exclusive access to one chain.
///
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct ChainGuard {
    key: ChainKey,
    registry: Arc<Registry>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ChainGuard {
    /// The chain this guard locks.
    pub fn key(&self) -> &ChainKey {
        &self.key
    }

    /// Whether this guard grants access to `key`.
    pub fn covers(&self, key: &ChainKey) -> bool {
        &self.key == key
    }
}

impl Drop for ChainGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Waiters clone the mutex under the registry lock, so a count of one
        // here means the registry holds the only reference.
        let mut locks = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

impl ChainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn acquire(&self, key: ChainKey) -> ChainGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.clone()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        ChainGuard {
            key,
            registry: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Number of chains currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
