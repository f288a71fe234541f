//! CartStore - in-memory cart state and operations
//!
//! # Operation Flow
//!
//! ```text
//! operation(args)
//!     ├─ 1. Take the write lock and mutate the item list
//!     ├─ 2. Clone the updated snapshot
//!     ├─ 3. Persist the snapshot on the blocking pool (full rewrite)
//!     ├─ 4. Broadcast a CartEvent to subscribers
//!     └─ 5. Return
//! ```
//!
//! Lookup misses on increment/decrement are silent no-ops, but the
//! snapshot is still rewritten, so after every operation the persisted
//! bytes match the in-memory cart.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::error::CartResult;
use super::event::CartEvent;
use super::item::{to_decimal, to_f64, CartItem};
use super::storage::CartStorage;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Cart state container
///
/// Holds the ordered item list in memory and persists the full snapshot
/// after every mutation. Mutations take the write lock for the whole
/// read-modify step, so rapid interleaved calls serialize on the
/// in-memory state instead of racing on a stale copy.
pub struct CartStore {
    storage: CartStorage,
    items: Arc<RwLock<Vec<CartItem>>>,
    event_tx: broadcast::Sender<CartEvent>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("item_count", &self.items.read().len())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a new CartStore backed by a database at the given path
    ///
    /// The store starts empty; call [`load`](Self::load) to restore the
    /// persisted cart.
    pub fn open(db_path: impl AsRef<Path>) -> CartResult<Self> {
        let storage = CartStorage::open(db_path)?;
        Ok(Self::with_storage(storage))
    }

    /// Create a CartStore with existing storage
    pub fn with_storage(storage: CartStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            items: Arc::new(RwLock::new(Vec::new())),
            event_tx,
        }
    }

    /// Subscribe to cart change events
    ///
    /// Lagging or dropped receivers never block or fail a mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.event_tx.subscribe()
    }

    /// Replace the in-memory cart with the persisted snapshot
    ///
    /// An absent snapshot loads an empty cart without error. Malformed
    /// stored data surfaces as a storage error and leaves the in-memory
    /// state untouched.
    pub async fn load(&self) -> CartResult<()> {
        let storage = self.storage.clone();
        let restored = tokio::task::spawn_blocking(move || storage.load_items()).await??;

        let items = restored.unwrap_or_default();
        let item_count = items.len();
        *self.items.write() = items;

        tracing::info!(item_count, "Cart restored from storage");
        let _ = self.event_tx.send(CartEvent::CartLoaded { item_count });
        Ok(())
    }

    /// Add an item to the cart
    ///
    /// If an item with the same id is already present, its quantity is
    /// incremented by 1 and the incoming item is otherwise ignored.
    /// Otherwise the item is appended with quantity one above its stated
    /// quantity. Persists afterward.
    pub async fn add_to_cart(&self, item: CartItem) -> CartResult<()> {
        item.validate()?;

        let event = {
            let mut items = self.items.write();
            match items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => {
                    existing.quantity += 1;
                    CartEvent::ItemIncremented {
                        id: existing.id.clone(),
                        quantity: existing.quantity,
                    }
                }
                None => {
                    let quantity = item.quantity + 1;
                    let id = item.id.clone();
                    items.push(CartItem { quantity, ..item });
                    CartEvent::ItemAdded { id, quantity }
                }
            }
        };

        self.persist().await?;
        let _ = self.event_tx.send(event);
        Ok(())
    }

    /// Increment the quantity of the matching item by 1
    ///
    /// Unknown ids are a no-op. Persists afterward either way.
    pub async fn increment(&self, id: &str) -> CartResult<()> {
        let event = {
            let mut items = self.items.write();
            items.iter_mut().find(|item| item.id == id).map(|item| {
                item.quantity += 1;
                CartEvent::ItemIncremented {
                    id: item.id.clone(),
                    quantity: item.quantity,
                }
            })
        };

        if event.is_none() {
            tracing::warn!(id = %id, "Increment on unknown item, cart unchanged");
        }

        self.persist().await?;
        if let Some(event) = event {
            let _ = self.event_tx.send(event);
        }
        Ok(())
    }

    /// Decrement the quantity of the matching item by 1
    ///
    /// Only applies while the resulting quantity stays above 0; an item at
    /// quantity 1 is left unchanged, never removed. Unknown ids are a
    /// no-op. Persists afterward either way.
    pub async fn decrement(&self, id: &str) -> CartResult<()> {
        let mut found = false;
        let event = {
            let mut items = self.items.write();
            items
                .iter_mut()
                .find(|item| item.id == id)
                .and_then(|item| {
                    found = true;
                    if item.quantity > 1 {
                        item.quantity -= 1;
                        Some(CartEvent::ItemDecremented {
                            id: item.id.clone(),
                            quantity: item.quantity,
                        })
                    } else {
                        None
                    }
                })
        };

        if !found {
            tracing::warn!(id = %id, "Decrement on unknown item, cart unchanged");
        } else if event.is_none() {
            tracing::debug!(id = %id, "Decrement at quantity floor, cart unchanged");
        }

        self.persist().await?;
        if let Some(event) = event {
            let _ = self.event_tx.send(event);
        }
        Ok(())
    }

    /// Snapshot of the current cart contents, in insertion order
    pub fn items(&self) -> Vec<CartItem> {
        self.items.read().clone()
    }

    /// Number of distinct line items
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the cart has no line items
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Sum of quantities across all line items (cart badge count)
    pub fn total_quantity(&self) -> u64 {
        self.items
            .read()
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Cart subtotal (sum of `price * quantity`), rounded to 2 decimal places
    pub fn subtotal(&self) -> f64 {
        let total: Decimal = self
            .items
            .read()
            .iter()
            .map(|item| to_decimal(item.price) * Decimal::from(item.quantity))
            .sum();
        to_f64(total)
    }

    /// Rewrite the full serialized cart to durable storage
    async fn persist(&self) -> CartResult<()> {
        let snapshot = self.items.read().clone();
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || storage.store_items(&snapshot)).await??;
        tracing::debug!("Cart snapshot persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::error::CartError;

    fn create_test_store() -> CartStore {
        CartStore::with_storage(CartStorage::open_in_memory().unwrap())
    }

    fn create_test_item(id: &str, price: f64, quantity: u32) -> CartItem {
        CartItem {
            id: id.to_string(),
            title: format!("Product {}", id),
            image_url: format!("https://example.com/{}.png", id),
            price,
            quantity,
        }
    }

    /// Persisted bytes must match the in-memory cart after every mutation
    fn assert_persisted_matches(store: &CartStore) {
        let persisted = store.storage.load_items().unwrap().unwrap_or_default();
        assert_eq!(persisted, store.items());
    }

    #[tokio::test]
    async fn test_add_new_item_lands_one_above_stated_quantity() {
        let store = create_test_store();

        store
            .add_to_cart(create_test_item("prod-1", 179.9, 1))
            .await
            .unwrap();

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_persisted_matches(&store);
    }

    #[tokio::test]
    async fn test_add_same_item_twice_yields_one_entry() {
        let store = create_test_store();
        let item = create_test_item("prod-1", 179.9, 1);

        store.add_to_cart(item.clone()).await.unwrap();
        store.add_to_cart(item).await.unwrap();

        let items = store.items();
        assert_eq!(items.len(), 1);
        // initial + 2: one from the first insert, one from the re-add
        assert_eq!(items[0].quantity, 3);
        assert_persisted_matches(&store);
    }

    #[tokio::test]
    async fn test_add_preserves_insertion_order() {
        let store = create_test_store();

        store
            .add_to_cart(create_test_item("prod-1", 10.0, 0))
            .await
            .unwrap();
        store
            .add_to_cart(create_test_item("prod-2", 20.0, 0))
            .await
            .unwrap();
        store
            .add_to_cart(create_test_item("prod-1", 10.0, 0))
            .await
            .unwrap();

        let ids: Vec<_> = store.items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec!["prod-1", "prod-2"]);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_item() {
        let store = create_test_store();

        let err = store
            .add_to_cart(create_test_item("prod-1", f64::NAN, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::InvalidItem(_)));
        assert!(store.is_empty());
        // Nothing was persisted either
        assert!(store.storage.load_items().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_bumps_quantity() {
        let store = create_test_store();
        store
            .add_to_cart(create_test_item("prod-1", 179.9, 1))
            .await
            .unwrap();

        store.increment("prod-1").await.unwrap();

        assert_eq!(store.items()[0].quantity, 3);
        assert_persisted_matches(&store);
    }

    #[tokio::test]
    async fn test_increment_unknown_id_is_noop_but_persists() {
        let store = create_test_store();
        store
            .add_to_cart(create_test_item("prod-1", 179.9, 1))
            .await
            .unwrap();
        let before = store.items();

        store.increment("prod-missing").await.unwrap();

        assert_eq!(store.items(), before);
        assert_persisted_matches(&store);
    }

    #[tokio::test]
    async fn test_decrement_reduces_quantity() {
        let store = create_test_store();
        store
            .add_to_cart(create_test_item("prod-1", 179.9, 2))
            .await
            .unwrap();

        store.decrement("prod-1").await.unwrap();

        assert_eq!(store.items()[0].quantity, 2);
        assert_persisted_matches(&store);
    }

    #[tokio::test]
    async fn test_decrement_at_quantity_one_leaves_item_unchanged() {
        let store = create_test_store();
        store
            .add_to_cart(create_test_item("prod-1", 179.9, 0))
            .await
            .unwrap();
        assert_eq!(store.items()[0].quantity, 1);

        store.decrement("prod-1").await.unwrap();

        // Never removed, never reduced to 0
        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1);
        assert_persisted_matches(&store);
    }

    #[tokio::test]
    async fn test_decrement_unknown_id_is_noop() {
        let store = create_test_store();

        store.decrement("prod-missing").await.unwrap();

        assert!(store.is_empty());
        assert_persisted_matches(&store);
    }

    #[tokio::test]
    async fn test_load_absent_snapshot_yields_empty_cart() {
        let store = create_test_store();

        store.load().await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_load_replaces_in_memory_state() {
        let storage = CartStorage::open_in_memory().unwrap();
        storage
            .store_items(&[create_test_item("prod-1", 179.9, 4)])
            .unwrap();

        let store = CartStore::with_storage(storage);
        store.load().await.unwrap();

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "prod-1");
        assert_eq!(items[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_totals() {
        let store = create_test_store();
        store
            .add_to_cart(create_test_item("prod-1", 19.99, 2))
            .await
            .unwrap();
        store
            .add_to_cart(create_test_item("prod-2", 0.01, 0))
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.total_quantity(), 4);
        // 19.99 * 3 + 0.01 * 1, decimal arithmetic
        assert_eq!(store.subtotal(), 59.98);
    }

    #[tokio::test]
    async fn test_subscribers_observe_events_in_mutation_order() {
        let store = create_test_store();
        let mut rx = store.subscribe();

        store
            .add_to_cart(create_test_item("prod-1", 179.9, 0))
            .await
            .unwrap();
        store.increment("prod-1").await.unwrap();
        store.decrement("prod-1").await.unwrap();
        store.increment("prod-missing").await.unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            CartEvent::ItemAdded {
                id: "prod-1".to_string(),
                quantity: 1
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            CartEvent::ItemIncremented {
                id: "prod-1".to_string(),
                quantity: 2
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            CartEvent::ItemDecremented {
                id: "prod-1".to_string(),
                quantity: 1
            }
        );
        // The no-op miss produced no event
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mutations_without_subscribers_succeed() {
        let store = create_test_store();

        store
            .add_to_cart(create_test_item("prod-1", 179.9, 0))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
    }
}
