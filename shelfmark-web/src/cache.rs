//! Per-owner cached collections with scoped mutations
//!
//! Each entity keeps one `ScopedCache` in the application state. A
//! collection is fetched from the store at most once per owner (presence of
//! the owner's entry is the fetched flag); successful mutations reconcile
//! the cached collection in place instead of invalidating it. Callers must
//! only reconcile after the store write succeeded; a failed write leaves
//! the cache untouched.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Records that can live in a `ScopedCache`
pub trait Keyed {
    fn key(&self) -> Uuid;
}

/// Cached collections keyed by owner id
#[derive(Debug, Clone)]
pub struct ScopedCache<T> {
    inner: Arc<RwLock<HashMap<Uuid, Vec<T>>>>,
}

impl<T> Default for ScopedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScopedCache<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Clone + Keyed> ScopedCache<T> {
    /// The owner's cached collection; `None` until `put` has run once
    pub async fn get(&self, owner: Uuid) -> Option<Vec<T>> {
        self.inner.read().await.get(&owner).cloned()
    }

    /// Store the result of the initial fetch
    pub async fn put(&self, owner: Uuid, items: Vec<T>) {
        self.inner.write().await.insert(owner, items);
    }

    /// Reconcile a successful create: prepend to the cached collection.
    /// No-op when the owner has not fetched yet.
    pub async fn insert(&self, owner: Uuid, item: T) {
        if let Some(items) = self.inner.write().await.get_mut(&owner) {
            items.insert(0, item);
        }
    }

    /// Reconcile a successful update: replace the matching record in place
    pub async fn replace(&self, owner: Uuid, item: T) {
        if let Some(items) = self.inner.write().await.get_mut(&owner) {
            if let Some(existing) = items.iter_mut().find(|i| i.key() == item.key()) {
                *existing = item;
            }
        }
    }

    /// Reconcile a successful delete: remove the matching record
    pub async fn remove(&self, owner: Uuid, key: Uuid) {
        if let Some(items) = self.inner.write().await.get_mut(&owner) {
            items.retain(|i| i.key() != key);
        }
    }
}
