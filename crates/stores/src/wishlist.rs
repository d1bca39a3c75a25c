//! The wishlist state container.
//!
//! Semantically a membership set of variant ids, stored as an ordered
//! list with uniqueness enforced on insert (server order is preserved
//! across reconciliation). Same persistence and hydration discipline as
//! the cart; unlike the cart, the whole list is also replaced wholesale
//! whenever the server's truth is reconciled in (see [`crate::sync`]).

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, warn};

use blood_orange_core::VariantId;

use crate::persist::PersistQueue;
use crate::storage::Storage;

/// Fixed storage key for the persisted wishlist document.
pub const WISHLIST_STORAGE_KEY: &str = "wishlist";

struct WishlistInner {
    ids: Mutex<Vec<VariantId>>,
    hydrated: AtomicBool,
    storage: Arc<dyn Storage>,
    revision: watch::Sender<u64>,
    persists: PersistQueue,
}

/// The wishlist state container. Construct once at the composition root
/// and clone freely; all clones share state.
#[derive(Clone)]
pub struct WishlistStore {
    inner: Arc<WishlistInner>,
}

impl WishlistStore {
    /// Create an empty, not-yet-hydrated wishlist over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(WishlistInner {
                ids: Mutex::new(Vec::new()),
                hydrated: AtomicBool::new(false),
                storage,
                revision,
                persists: PersistQueue::default(),
            }),
        }
    }

    /// Load the persisted membership list, once. Same contract as
    /// [`crate::CartStore::hydrate`]: the flag flips to `true` exactly
    /// once, absent or unreadable documents hydrate as empty, repeat
    /// calls are no-ops.
    pub async fn hydrate(&self) {
        if self.inner.hydrated.load(Ordering::SeqCst) {
            return;
        }

        let loaded = match self.inner.storage.get(WISHLIST_STORAGE_KEY).await {
            Ok(Some(document)) => match serde_json::from_str::<Vec<VariantId>>(&document) {
                Ok(ids) => ids,
                Err(err) => {
                    warn!(error = %err, "discarding unreadable wishlist snapshot");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "wishlist hydration read failed; starting empty");
                Vec::new()
            }
        };

        let mut ids = dedupe(loaded);

        {
            let mut guard = self.lock_ids();
            std::mem::swap(&mut *guard, &mut ids);
        }

        self.inner.hydrated.store(true, Ordering::SeqCst);
        self.bump_revision();
        debug!("wishlist hydrated");
    }

    /// Whether the persisted state has been loaded.
    #[must_use]
    pub fn has_hydrated(&self) -> bool {
        self.inner.hydrated.load(Ordering::SeqCst)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the whole membership list (server reconciliation).
    /// Duplicates in the input are dropped, keeping first-seen order.
    pub fn set_all(&self, ids: Vec<VariantId>) {
        let mut ids = dedupe(ids);
        {
            let mut guard = self.lock_ids();
            std::mem::swap(&mut *guard, &mut ids);
        }
        self.changed();
    }

    /// Insert `id` if absent; returns whether it was inserted.
    pub fn add(&self, id: &VariantId) -> bool {
        let inserted = {
            let mut ids = self.lock_ids();
            if ids.contains(id) {
                false
            } else {
                ids.push(id.clone());
                true
            }
        };
        if inserted {
            self.changed();
        }
        inserted
    }

    /// Remove `id` if present; returns whether it was removed.
    pub fn remove(&self, id: &VariantId) -> bool {
        let removed = {
            let mut ids = self.lock_ids();
            let before = ids.len();
            ids.retain(|existing| existing != id);
            ids.len() != before
        };
        if removed {
            self.changed();
        }
        removed
    }

    /// Empty the wishlist.
    pub fn clear(&self) {
        {
            let mut ids = self.lock_ids();
            ids.clear();
        }
        self.changed();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Membership check.
    #[must_use]
    pub fn contains(&self, id: &VariantId) -> bool {
        self.lock_ids().contains(id)
    }

    /// Number of liked variants.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock_ids().len()
    }

    /// Snapshot of the membership list, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<VariantId> {
        self.lock_ids().clone()
    }

    /// Subscribe to change notifications (revision counter).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Wait for in-flight persist writes to finish.
    pub async fn persist_settled(&self) {
        self.inner.persists.settled().await;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn lock_ids(&self) -> std::sync::MutexGuard<'_, Vec<VariantId>> {
        self.inner
            .ids
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn changed(&self) {
        self.bump_revision();
        self.schedule_persist();
    }

    fn bump_revision(&self) {
        self.inner.revision.send_modify(|rev| *rev += 1);
    }

    fn schedule_persist(&self) {
        let inner = Arc::clone(&self.inner);
        inner.persists.begin();
        tokio::spawn(async move {
            let snapshot = {
                let ids = inner
                    .ids
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                serde_json::to_string(&*ids)
            };

            match snapshot {
                Ok(document) => {
                    if let Err(err) = inner.storage.set(WISHLIST_STORAGE_KEY, &document).await {
                        error!(error = %err, "failed to persist wishlist");
                    }
                }
                Err(err) => error!(error = %err, "failed to serialize wishlist"),
            }

            inner.persists.finish();
        });
    }
}

/// Drop duplicate ids, keeping first-seen order.
fn dedupe(ids: Vec<VariantId>) -> Vec<VariantId> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::storage::MemoryStorage;

    fn store() -> (WishlistStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (
            WishlistStore::new(Arc::clone(&storage) as Arc<dyn Storage>),
            storage,
        )
    }

    fn v(id: &str) -> VariantId {
        VariantId::new(id)
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (wishlist, _) = store();

        assert!(wishlist.add(&v("v1")));
        assert!(!wishlist.add(&v("v1")));

        assert_eq!(wishlist.count(), 1);
        assert!(wishlist.contains(&v("v1")));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (wishlist, _) = store();
        wishlist.add(&v("v1"));
        wishlist.add(&v("v2"));

        assert!(wishlist.remove(&v("v1")));
        assert!(!wishlist.remove(&v("v1")));
        assert_eq!(wishlist.ids(), vec![v("v2")]);

        wishlist.clear();
        assert_eq!(wishlist.count(), 0);
    }

    #[tokio::test]
    async fn test_set_all_replaces_wholesale() {
        let (wishlist, _) = store();
        wishlist.add(&v("v1"));
        wishlist.add(&v("v2"));

        wishlist.set_all(vec![v("v2"), v("v3")]);

        // Replace, not union: v1 is gone
        assert_eq!(wishlist.ids(), vec![v("v2"), v("v3")]);
    }

    #[tokio::test]
    async fn test_set_all_dedupes_preserving_order() {
        let (wishlist, _) = store();
        wishlist.set_all(vec![v("v2"), v("v3"), v("v2")]);
        assert_eq!(wishlist.ids(), vec![v("v2"), v("v3")]);
    }

    #[tokio::test]
    async fn test_hydration_flag_lifecycle() {
        let (wishlist, _) = store();
        assert!(!wishlist.has_hydrated());

        wishlist.hydrate().await;
        assert!(wishlist.has_hydrated());

        wishlist.hydrate().await;
        assert!(wishlist.has_hydrated());
    }

    #[tokio::test]
    async fn test_persistence_roundtrip() {
        let (wishlist, storage) = store();
        wishlist.add(&v("v1"));
        wishlist.add(&v("v2"));
        wishlist.persist_settled().await;

        let reloaded = WishlistStore::new(storage as Arc<dyn Storage>);
        reloaded.hydrate().await;
        assert_eq!(reloaded.ids(), vec![v("v1"), v("v2")]);
    }

    #[tokio::test]
    async fn test_hydration_discards_corrupt_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        storage.seed(WISHLIST_STORAGE_KEY, "{broken");

        let wishlist = WishlistStore::new(Arc::clone(&storage) as Arc<dyn Storage>);
        wishlist.hydrate().await;

        assert!(wishlist.has_hydrated());
        assert_eq!(wishlist.count(), 0);
    }
}
