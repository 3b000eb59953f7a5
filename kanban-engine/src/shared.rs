//! Single-writer handle for using one engine from many async tasks

use crate::engine::KanbanEngine;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// A cloneable handle to one engine behind an async mutex.
///
/// Every call runs under the same lock, so operations on the board are
/// serialized and observers are notified in the order changes happen.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<KanbanEngine>>,
}

impl SharedEngine {
    pub fn new(engine: KanbanEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine for a sequence of operations
    pub async fn lock(&self) -> MutexGuard<'_, KanbanEngine> {
        self.inner.lock().await
    }

    /// Run one closure against the engine under the lock
    pub async fn with<R>(&self, f: impl FnOnce(&mut KanbanEngine) -> R) -> R {
        let mut engine = self.inner.lock().await;
        f(&mut engine)
    }
}

impl From<KanbanEngine> for SharedEngine {
    fn from(engine: KanbanEngine) -> Self {
        Self::new(engine)
    }
}
