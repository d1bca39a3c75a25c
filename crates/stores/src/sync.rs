//! Wishlist reconciliation against server truth.
//!
//! Reconciliation is one-directional: the server wins, wholesale. The
//! application calls [`WishlistReconciler::reconcile`] whenever the
//! authenticated identity becomes known or changes; it is an ordinary
//! async function, not a framework lifecycle hook.
//!
//! Two gates keep it honest:
//! - nothing happens until the local store has hydrated (an unhydrated
//!   store is not authoritative, and overwriting it early would race
//!   the load);
//! - nothing happens while an optimistic toggle is outstanding, so a
//!   reconciliation fetch that was racing a toggle cannot silently
//!   discard it. The next reconciliation converges either way.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, instrument};

use blood_orange_client::{ApiClient, ApiError};
use blood_orange_core::{CustomerId, VariantId};

use crate::wishlist::WishlistStore;

/// Reconciles the local wishlist with the backend.
#[derive(Clone)]
pub struct WishlistReconciler {
    store: WishlistStore,
    client: ApiClient,
    toggles_in_flight: Arc<AtomicUsize>,
}

impl WishlistReconciler {
    #[must_use]
    pub fn new(store: WishlistStore, client: ApiClient) -> Self {
        Self {
            store,
            client,
            toggles_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Overwrite local wishlist state with server truth.
    ///
    /// With no authenticated identity the wishlist is force-cleared:
    /// local state must not leak across user sessions or persist for a
    /// logged-out visitor. With an identity, the server's membership
    /// replaces the local list wholesale (not a merge).
    ///
    /// Skips quietly when the store has not hydrated yet or a toggle is
    /// in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fetch fails; local state is left
    /// untouched in that case.
    #[instrument(skip(self, identity), fields(authenticated = identity.is_some()))]
    pub async fn reconcile(&self, identity: Option<&CustomerId>) -> Result<(), ApiError> {
        if !self.store.has_hydrated() {
            debug!("skipping reconciliation before hydration");
            return Ok(());
        }

        if self.toggles_in_flight.load(Ordering::SeqCst) > 0 {
            debug!("skipping reconciliation while a toggle is in flight");
            return Ok(());
        }

        match identity {
            None => {
                self.store.set_all(Vec::new());
                Ok(())
            }
            Some(customer) => {
                let server_ids = self.client.fetch_wishlist().await?;
                debug!(customer = %customer, count = server_ids.len(), "wishlist reconciled");
                self.store.set_all(server_ids);
                Ok(())
            }
        }
    }

    /// Optimistically add `id` locally and mirror it to the server.
    ///
    /// The local update stands even if the server call fails: the
    /// caller decides whether to revert (the error carries the server's
    /// verdict), and the next reconciliation converges to server truth
    /// regardless.
    ///
    /// # Errors
    ///
    /// Returns the server mutation error, if any.
    pub async fn toggle_on(&self, id: &VariantId) -> Result<(), ApiError> {
        let _guard = ToggleGuard::hold(&self.toggles_in_flight);
        self.store.add(id);
        self.client.add_wishlist_item(id).await
    }

    /// Optimistically remove `id` locally and mirror it to the server.
    ///
    /// Same failure contract as [`Self::toggle_on`].
    ///
    /// # Errors
    ///
    /// Returns the server mutation error, if any.
    pub async fn toggle_off(&self, id: &VariantId) -> Result<(), ApiError> {
        let _guard = ToggleGuard::hold(&self.toggles_in_flight);
        self.store.remove(id);
        self.client.remove_wishlist_item(id).await
    }

    /// The store this reconciler writes to.
    #[must_use]
    pub fn store(&self) -> &WishlistStore {
        &self.store
    }
}

/// Counts a toggle for the duration of its whole operation, error paths
/// included.
struct ToggleGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> ToggleGuard<'a> {
    fn hold(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
