//! The cart state container.
//!
//! The cart is the authoritative local line-item list for an
//! in-progress order, independent of server state. Mutations apply
//! synchronously in memory and schedule a fire-and-forget persist of the
//! whole list; reads are derived queries over a snapshot.
//!
//! Invariants the container maintains:
//! - no two items share a sku;
//! - every stored item has `quantity >= 1`: a quantity reaching zero
//!   removes the item instead;
//! - `add_item` always means "one more unit": an incoming item's own
//!   quantity field is ignored, bulk-set goes through
//!   [`CartStore::update_quantity`].

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use blood_orange_core::{CartItem, Sku};

use crate::persist::PersistQueue;
use crate::storage::Storage;

/// Fixed storage key for the persisted cart document.
pub const CART_STORAGE_KEY: &str = "cart";

struct CartInner {
    items: Mutex<Vec<CartItem>>,
    hydrated: AtomicBool,
    storage: Arc<dyn Storage>,
    revision: watch::Sender<u64>,
    persists: PersistQueue,
}

/// The cart state container. Construct once at the composition root and
/// clone freely; all clones share state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

impl CartStore {
    /// Create an empty, not-yet-hydrated cart over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(CartInner {
                items: Mutex::new(Vec::new()),
                hydrated: AtomicBool::new(false),
                storage,
                revision,
                persists: PersistQueue::default(),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Hydration
    // ─────────────────────────────────────────────────────────────────────

    /// Load the persisted item list, once.
    ///
    /// Until this resolves, [`Self::has_hydrated`] is `false` and an
    /// empty cart must not be treated as authoritative. The flag flips
    /// to `true` exactly once and never reverts, including when the
    /// persisted document is absent or unreadable (logged and treated
    /// as empty). Calling again after hydration is a no-op.
    pub async fn hydrate(&self) {
        if self.inner.hydrated.load(Ordering::SeqCst) {
            return;
        }

        let loaded = match self.inner.storage.get(CART_STORAGE_KEY).await {
            Ok(Some(document)) => match serde_json::from_str::<Vec<CartItem>>(&document) {
                Ok(items) => items,
                Err(err) => {
                    warn!(error = %err, "discarding unreadable cart snapshot");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "cart hydration read failed; starting empty");
                Vec::new()
            }
        };

        // Persisted data is still held to the container's invariants.
        let mut items = sanitize(loaded);

        {
            let mut guard = self.lock_items();
            std::mem::swap(&mut *guard, &mut items);
        }

        self.inner.hydrated.store(true, Ordering::SeqCst);
        self.bump_revision();
        debug!("cart hydrated");
    }

    /// Whether the persisted state has been loaded. `false` means an
    /// empty-looking cart may simply not be loaded yet.
    #[must_use]
    pub fn has_hydrated(&self) -> bool {
        self.inner.hydrated.load(Ordering::SeqCst)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Add one unit of `item`. An existing line with the same sku gains
    /// exactly one unit; a new line starts at quantity 1. The incoming
    /// item's own quantity field is ignored either way.
    pub fn add_item(&self, item: CartItem) {
        {
            let mut items = self.lock_items();
            if let Some(existing) = items.iter_mut().find(|i| i.sku == item.sku) {
                existing.quantity = existing.quantity.saturating_add(1);
            } else {
                items.push(CartItem {
                    quantity: 1,
                    ..item
                });
            }
        }
        self.changed();
    }

    /// Remove the line with `sku`. Absent skus are a no-op, not an
    /// error.
    pub fn remove_item(&self, sku: &Sku) {
        let removed = {
            let mut items = self.lock_items();
            let before = items.len();
            items.retain(|i| &i.sku != sku);
            items.len() != before
        };
        if removed {
            self.changed();
        }
    }

    /// Set the line's quantity to exactly `quantity`; zero removes the
    /// line. Absent skus are a no-op.
    pub fn update_quantity(&self, sku: &Sku, quantity: u32) {
        if quantity == 0 {
            self.remove_item(sku);
            return;
        }

        let updated = {
            let mut items = self.lock_items();
            match items.iter_mut().find(|i| &i.sku == sku) {
                Some(item) => {
                    item.quantity = quantity;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.changed();
        }
    }

    /// Empty the cart unconditionally.
    pub fn clear(&self) {
        {
            let mut items = self.lock_items();
            items.clear();
        }
        self.changed();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Sum of all quantities (not the count of distinct lines).
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lock_items()
            .iter()
            .map(|i| u64::from(i.quantity))
            .sum()
    }

    /// Sum of effective line totals. Uses each item's stored effective
    /// price, never `original_price`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lock_items().iter().map(CartItem::line_total).sum()
    }

    /// Whether a line with `sku` exists.
    #[must_use]
    pub fn contains(&self, sku: &Sku) -> bool {
        self.lock_items().iter().any(|i| &i.sku == sku)
    }

    /// Quantity of the line with `sku`, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, sku: &Sku) -> u32 {
        self.lock_items()
            .iter()
            .find(|i| &i.sku == sku)
            .map_or(0, |i| i.quantity)
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock_items().clone()
    }

    /// Subscribe to change notifications: the value is a revision
    /// counter bumped on every mutation and on hydration.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Wait for in-flight persist writes to finish. Mutations stay
    /// fire-and-forget; this exists for shutdown paths and tests.
    pub async fn persist_settled(&self) {
        self.inner.persists.settled().await;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn lock_items(&self) -> std::sync::MutexGuard<'_, Vec<CartItem>> {
        self.inner
            .items
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

    /// Fire-and-forget persist. The task serializes the list as it is
    /// when the task runs, so out-of-order task execution can never
    /// clobber newer state with older state.
    fn schedule_persist(&self) {
        let inner = Arc::clone(&self.inner);
        inner.persists.begin();
        tokio::spawn(async move {
            let snapshot = {
                let items = inner
                    .items
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                serde_json::to_string(&*items)
            };

            match snapshot {
                Ok(document) => {
                    if let Err(err) = inner.storage.set(CART_STORAGE_KEY, &document).await {
                        error!(error = %err, "failed to persist cart");
                    }
                }
                Err(err) => error!(error = %err, "failed to serialize cart"),
            }

            inner.persists.finish();
        });
    }
}

/// Drop persisted entries that violate the container's invariants
/// (zero quantities, duplicate skus keeping the first).
fn sanitize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = std::collections::HashSet::new();
    let mut sanitized = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity == 0 {
            warn!(sku = %item.sku, "dropping persisted cart line with zero quantity");
            continue;
        }
        if !seen.insert(item.sku.clone()) {
            warn!(sku = %item.sku, "dropping persisted cart line with duplicate sku");
            continue;
        }
        sanitized.push(item);
    }

    sanitized
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use blood_orange_core::{ProductId, VariantId};

    use crate::storage::MemoryStorage;

    fn item(sku: &str, price: &str) -> CartItem {
        CartItem {
            sku: Sku::new(sku),
            product_id: ProductId::new("p1"),
            variant_id: VariantId::new("v1"),
            title: format!("Item {sku}"),
            unit_price: price.parse().unwrap(),
            original_price: None,
            image_url: None,
            quantity: 1,
            attributes: BTreeMap::new(),
        }
    }

    fn store() -> (CartStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (CartStore::new(Arc::clone(&storage) as Arc<dyn Storage>), storage)
    }

    #[tokio::test]
    async fn test_add_item_same_sku_increments_quantity() {
        let (cart, _) = store();

        // Incoming quantity is ignored on both paths
        let mut bulk = item("A", "20.00");
        bulk.quantity = 99;

        cart.add_item(bulk.clone());
        cart.add_item(bulk.clone());
        cart.add_item(bulk);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&Sku::new("A")), 3);
    }

    #[tokio::test]
    async fn test_update_quantity_zero_removes_item() {
        let (cart, _) = store();
        cart.add_item(item("A", "20.00"));

        cart.update_quantity(&Sku::new("A"), 0);
        assert!(!cart.contains(&Sku::new("A")));
        assert_eq!(cart.total_items(), 0);
    }

    #[tokio::test]
    async fn test_update_quantity_sets_exact_value() {
        let (cart, _) = store();
        cart.add_item(item("A", "20.00"));

        cart.update_quantity(&Sku::new("A"), 5);
        assert_eq!(cart.quantity_of(&Sku::new("A")), 5);

        // Absent sku is a no-op
        cart.update_quantity(&Sku::new("Z"), 5);
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_item_absent_is_noop() {
        let (cart, _) = store();
        cart.add_item(item("A", "20.00"));

        cart.remove_item(&Sku::new("Z"));
        assert_eq!(cart.items().len(), 1);

        cart.remove_item(&Sku::new("A"));
        assert!(cart.items().is_empty());
    }

    #[tokio::test]
    async fn test_totals_use_effective_price() {
        let (cart, _) = store();

        let mut discounted = item("A", "10.00");
        discounted.original_price = Some("15.00".parse().unwrap());
        cart.add_item(discounted.clone());
        cart.add_item(discounted);
        cart.add_item(item("B", "5.50"));

        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), "25.50".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn test_hydration_flag_lifecycle() {
        let (cart, _) = store();
        assert!(!cart.has_hydrated());

        cart.hydrate().await;
        assert!(cart.has_hydrated());

        // Idempotent, and the flag never reverts
        cart.hydrate().await;
        assert!(cart.has_hydrated());
    }

    #[tokio::test]
    async fn test_hydration_loads_persisted_items() {
        let storage = Arc::new(MemoryStorage::new());
        let persisted = serde_json::to_string(&vec![item("A", "20.00")]).unwrap();
        storage.seed(CART_STORAGE_KEY, &persisted);

        let cart = CartStore::new(Arc::clone(&storage) as Arc<dyn Storage>);
        assert_eq!(cart.total_items(), 0, "not authoritative before hydration");

        cart.hydrate().await;
        assert_eq!(cart.total_items(), 1);
        assert!(cart.contains(&Sku::new("A")));
    }

    #[tokio::test]
    async fn test_hydration_discards_corrupt_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        storage.seed(CART_STORAGE_KEY, "not json");

        let cart = CartStore::new(Arc::clone(&storage) as Arc<dyn Storage>);
        cart.hydrate().await;

        assert!(cart.has_hydrated());
        assert!(cart.items().is_empty());
    }

    #[tokio::test]
    async fn test_hydration_sanitizes_invalid_lines() {
        let storage = Arc::new(MemoryStorage::new());
        let mut zero = item("Z", "1.00");
        zero.quantity = 0;
        let mut dup = item("A", "2.00");
        dup.quantity = 2;
        let persisted =
            serde_json::to_string(&vec![item("A", "2.00"), zero, dup]).unwrap();
        storage.seed(CART_STORAGE_KEY, &persisted);

        let cart = CartStore::new(Arc::clone(&storage) as Arc<dyn Storage>);
        cart.hydrate().await;

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&Sku::new("A")), 1);
    }

    #[tokio::test]
    async fn test_mutations_persist_under_fixed_key() {
        let (cart, storage) = store();
        cart.add_item(item("A", "20.00"));
        cart.add_item(item("B", "1.00"));
        cart.persist_settled().await;

        let document = storage.get(CART_STORAGE_KEY).await.unwrap().unwrap();
        let persisted: Vec<CartItem> = serde_json::from_str(&document).unwrap();
        assert_eq!(persisted.len(), 2);

        // A fresh store over the same storage hydrates to the same cart
        let reloaded = CartStore::new(storage as Arc<dyn Storage>);
        reloaded.hydrate().await;
        assert_eq!(reloaded.total_items(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_sees_revision_bumps() {
        let (cart, _) = store();
        let mut rx = cart.subscribe();
        let initial = *rx.borrow_and_update();

        cart.add_item(item("A", "20.00"));
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update() > initial);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let (cart, _) = store();
        let sku = Sku::new("A");

        cart.add_item(item("A", "20.00"));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&sku), 1);
        assert_eq!(cart.total_price(), "20.00".parse::<Decimal>().unwrap());

        cart.add_item(item("A", "20.00"));
        assert_eq!(cart.quantity_of(&sku), 2);
        assert_eq!(cart.total_price(), "40.00".parse::<Decimal>().unwrap());

        cart.update_quantity(&sku, 1);
        assert_eq!(cart.quantity_of(&sku), 1);
        assert_eq!(cart.total_price(), "20.00".parse::<Decimal>().unwrap());

        cart.remove_item(&sku);
        assert!(cart.items().is_empty());
        assert_eq!(cart.total_items(), 0);
    }
}
