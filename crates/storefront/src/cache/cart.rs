//! Owner-scoped cart state container.
//!
//! Holds the lines of exactly one owner's cart in memory, mirrors every
//! mutation into the device's slot store, and publishes a full snapshot to
//! watchers on every change. Identity changes swap the whole collection via
//! [`CartCache::rebind`]; they never merge.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use pitstop_core::{OwnerKey, PartId};

use super::store::SlotStore;
use crate::models::part::PartSummary;

/// Slot key prefix for cart collections.
pub const CART_PREFIX: &str = "cart";

/// One cart line: a part snapshot and how many pieces of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub part: PartSummary,
    pub quantity: u32,
}

impl CartLine {
    /// Gross total for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.part.price * Decimal::from(self.quantity)
    }
}

/// Point-in-time view of a cart, published to watchers on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Owner the lines belong to.
    pub owner: OwnerKey,
    /// Lines in insertion order, at most one per part.
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    fn empty(owner: OwnerKey) -> Self {
        Self {
            owner,
            lines: Vec::new(),
        }
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Gross sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Rejected cart mutations.
///
/// Every rejection is observable so callers never show a success
/// notification for a mutation that did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartError {
    /// Guests cannot put items in a cart; the caller should point the
    /// visitor at the login page.
    #[error("sign in to add items to the cart")]
    SignInRequired,

    /// Quantities start at one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The identity changed between the caller resolving its owner and the
    /// mutation applying; the write was discarded, the reload wins.
    #[error("cart owner changed while the request was in flight")]
    Superseded,
}

struct Bound {
    owner: OwnerKey,
    lines: Vec<CartLine>,
}

/// The cart state container for one device.
///
/// All operations serialize behind one mutex, including [`rebind`], so a
/// mutation and an identity switch can never interleave. Mutations take the
/// owner the caller resolved (`origin`) and are discarded with
/// [`CartError::Superseded`] when a rebind won the race.
///
/// [`rebind`]: CartCache::rebind
pub struct CartCache {
    store: Arc<dyn SlotStore>,
    state: Mutex<Bound>,
    changes: watch::Sender<CartSnapshot>,
}

impl CartCache {
    /// Construct a cart bound to `owner`, loading its stored lines.
    ///
    /// A corrupt or unreadable slot loads as an empty cart; this is cached
    /// convenience state, not a system of record.
    #[must_use]
    pub fn new(store: Arc<dyn SlotStore>, owner: OwnerKey) -> Self {
        let lines = load_lines(store.as_ref(), owner);
        let (changes, _) = watch::channel(CartSnapshot {
            owner,
            lines: lines.clone(),
        });
        Self {
            store,
            state: Mutex::new(Bound { owner, lines }),
            changes,
        }
    }

    /// The owner the cart is currently bound to.
    #[must_use]
    pub fn owner(&self) -> OwnerKey {
        self.lock().owner
    }

    /// Current snapshot without mutating anything.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let state = self.lock();
        CartSnapshot {
            owner: state.owner,
            lines: state.lines.clone(),
        }
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.snapshot().total_item_count()
    }

    /// Subscribe to snapshots; the receiver always holds the latest one and
    /// is notified on every change, including rebinds.
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<CartSnapshot> {
        self.changes.subscribe()
    }

    /// Switch the bound owner, replacing (never merging) the collection.
    ///
    /// The outgoing owner's lines need no write here: every mutation
    /// already persisted them. Binding to the current owner is a no-op.
    pub fn rebind(&self, owner: OwnerKey) -> CartSnapshot {
        let mut state = self.lock();
        if state.owner != owner {
            debug!(from = %state.owner, to = %owner, "rebinding cart");
            state.owner = owner;
            state.lines = load_lines(self.store.as_ref(), owner);
            return self.publish(&state);
        }
        CartSnapshot {
            owner: state.owner,
            lines: state.lines.clone(),
        }
    }

    /// Add `quantity` pieces of `part`, merging into an existing line.
    ///
    /// # Errors
    ///
    /// [`CartError::Superseded`] when `origin` no longer matches the bound
    /// owner, [`CartError::SignInRequired`] for guests, and
    /// [`CartError::InvalidQuantity`] for a zero quantity.
    pub fn add(
        &self,
        origin: OwnerKey,
        part: &PartSummary,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let mut state = self.lock();
        if state.owner != origin {
            return Err(CartError::Superseded);
        }
        if origin.is_guest() {
            return Err(CartError::SignInRequired);
        }
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if let Some(line) = state.lines.iter_mut().find(|line| line.part.id == part.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            state.lines.push(CartLine {
                part: part.clone(),
                quantity,
            });
        }

        self.persist(&state);
        Ok(self.publish(&state))
    }

    /// Set the quantity of a line; zero or negative removes it. Unknown
    /// part IDs are a no-op.
    ///
    /// # Errors
    ///
    /// [`CartError::Superseded`] when `origin` no longer matches the bound
    /// owner.
    pub fn update_quantity(
        &self,
        origin: OwnerKey,
        part_id: PartId,
        quantity: i64,
    ) -> Result<CartSnapshot, CartError> {
        let mut state = self.lock();
        if state.owner != origin {
            return Err(CartError::Superseded);
        }

        if quantity <= 0 {
            state.lines.retain(|line| line.part.id != part_id);
        } else if let Some(line) = state.lines.iter_mut().find(|line| line.part.id == part_id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }

        self.persist(&state);
        Ok(self.publish(&state))
    }

    /// Remove a line if present; a no-op otherwise.
    ///
    /// # Errors
    ///
    /// [`CartError::Superseded`] when `origin` no longer matches the bound
    /// owner.
    pub fn remove(&self, origin: OwnerKey, part_id: PartId) -> Result<CartSnapshot, CartError> {
        let mut state = self.lock();
        if state.owner != origin {
            return Err(CartError::Superseded);
        }

        state.lines.retain(|line| line.part.id != part_id);
        self.persist(&state);
        Ok(self.publish(&state))
    }

    /// Empty the cart and delete its storage slot.
    ///
    /// Deleting (rather than writing an empty list) means a later load for
    /// this owner finds nothing at all.
    ///
    /// # Errors
    ///
    /// [`CartError::Superseded`] when `origin` no longer matches the bound
    /// owner.
    pub fn clear(&self, origin: OwnerKey) -> Result<CartSnapshot, CartError> {
        let mut state = self.lock();
        if state.owner != origin {
            return Err(CartError::Superseded);
        }

        state.lines.clear();
        let key = state.owner.slot_key(CART_PREFIX);
        if let Err(err) = self.store.delete(&key) {
            warn!(%key, error = %err, "failed to delete cart slot");
        }
        Ok(self.publish(&state))
    }

    fn lock(&self) -> MutexGuard<'_, Bound> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best-effort synchronous write of the current lines. Failures are
    /// logged and dropped; the in-memory state stays authoritative until
    /// the process exits.
    fn persist(&self, state: &Bound) {
        let key = state.owner.slot_key(CART_PREFIX);
        match serde_json::to_string(&state.lines) {
            Ok(json) => {
                if let Err(err) = self.store.save(&key, &json) {
                    warn!(%key, error = %err, "failed to persist cart slot");
                }
            }
            Err(err) => warn!(%key, error = %err, "failed to serialize cart lines"),
        }
    }

    fn publish(&self, state: &Bound) -> CartSnapshot {
        let snapshot = CartSnapshot {
            owner: state.owner,
            lines: state.lines.clone(),
        };
        self.changes.send_replace(snapshot.clone());
        snapshot
    }
}

impl std::fmt::Debug for CartCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CartCache")
            .field("owner", &state.owner)
            .field("lines", &state.lines.len())
            .finish_non_exhaustive()
    }
}

/// Load an owner's stored lines, treating anything unreadable as empty.
fn load_lines(store: &dyn SlotStore, owner: OwnerKey) -> Vec<CartLine> {
    let key = owner.slot_key(CART_PREFIX);
    match store.load(&key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|err| {
            warn!(%key, error = %err, "corrupt cart slot, starting empty");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(%key, error = %err, "unreadable cart slot, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::store::MemoryStore;
    use super::*;
    use pitstop_core::UserId;

    fn part(name: &str, price: i64) -> PartSummary {
        PartSummary {
            id: PartId::generate(),
            name: name.into(),
            category: "Fékrendszer".into(),
            brand: "Bosch".into(),
            price: Decimal::new(price, 0),
            image_url: None,
            description: None,
        }
    }

    fn user_cart() -> (Arc<MemoryStore>, OwnerKey, CartCache) {
        let store = Arc::new(MemoryStore::new());
        let owner = OwnerKey::User(UserId::generate());
        let cart = CartCache::new(store.clone(), owner);
        (store, owner, cart)
    }

    #[test]
    fn test_add_appends_in_insertion_order() {
        let (_, owner, cart) = user_cart();
        let (a, b) = (part("Féktárcsa", 24_500), part("Olajszűrő", 4500));

        cart.add(owner, &a, 1).unwrap();
        let snapshot = cart.add(owner, &b, 2).unwrap();

        let ids: Vec<_> = snapshot.lines.iter().map(|l| l.part.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert_eq!(snapshot.total_item_count(), 3);
    }

    #[test]
    fn test_add_merges_duplicate_part_into_one_line() {
        let (_, owner, cart) = user_cart();
        let brake = part("Féktárcsa", 24_500);

        cart.add(owner, &brake, 2).unwrap();
        let snapshot = cart.add(owner, &brake, 3).unwrap();

        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines.first().unwrap().quantity, 5);
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let (_, owner, cart) = user_cart();
        assert_eq!(
            cart.add(owner, &part("Féktárcsa", 24_500), 0),
            Err(CartError::InvalidQuantity)
        );
        assert!(cart.snapshot().is_empty());
    }

    #[test]
    fn test_guest_add_is_rejected_and_leaves_cart_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let cart = CartCache::new(store.clone(), OwnerKey::Guest);

        let result = cart.add(OwnerKey::Guest, &part("Féktárcsa", 24_500), 1);

        assert_eq!(result, Err(CartError::SignInRequired));
        assert!(cart.snapshot().is_empty());
        assert!(!store.contains("cart_guest"));
    }

    #[test]
    fn test_update_quantity_sets_exact_value_in_place() {
        let (_, owner, cart) = user_cart();
        let (a, b) = (part("Féktárcsa", 24_500), part("Olajszűrő", 4500));
        cart.add(owner, &a, 1).unwrap();
        cart.add(owner, &b, 1).unwrap();

        let snapshot = cart.update_quantity(owner, a.id, 7).unwrap();

        assert_eq!(snapshot.lines.first().unwrap().part.id, a.id);
        assert_eq!(snapshot.lines.first().unwrap().quantity, 7);
    }

    #[test]
    fn test_update_quantity_floor_removes_line() {
        let (_, owner, cart) = user_cart();
        let brake = part("Féktárcsa", 24_500);
        cart.add(owner, &brake, 2).unwrap();

        assert!(cart.update_quantity(owner, brake.id, 0).unwrap().is_empty());

        cart.add(owner, &brake, 2).unwrap();
        assert!(cart.update_quantity(owner, brake.id, -3).unwrap().is_empty());
    }

    #[test]
    fn test_update_quantity_unknown_part_is_noop() {
        let (_, owner, cart) = user_cart();
        cart.add(owner, &part("Féktárcsa", 24_500), 2).unwrap();

        let snapshot = cart.update_quantity(owner, PartId::generate(), 5).unwrap();
        assert_eq!(snapshot.total_item_count(), 2);
    }

    #[test]
    fn test_remove_missing_part_is_noop() {
        let (_, owner, cart) = user_cart();
        cart.add(owner, &part("Féktárcsa", 24_500), 1).unwrap();

        let snapshot = cart.remove(owner, PartId::generate()).unwrap();
        assert_eq!(snapshot.lines.len(), 1);
    }

    #[test]
    fn test_mutations_survive_reload_for_same_owner() {
        let (store, owner, cart) = user_cart();
        let (a, b) = (part("Féktárcsa", 24_500), part("Olajszűrő", 4500));
        cart.add(owner, &a, 2).unwrap();
        cart.add(owner, &b, 1).unwrap();
        cart.update_quantity(owner, b.id, 4).unwrap();

        let reloaded = CartCache::new(store, owner);
        assert_eq!(reloaded.snapshot().lines, cart.snapshot().lines);
    }

    #[test]
    fn test_owners_never_see_each_others_lines() {
        let store = Arc::new(MemoryStore::new());
        let (u1, u2) = (
            OwnerKey::User(UserId::generate()),
            OwnerKey::User(UserId::generate()),
        );
        let cart = CartCache::new(store, u1);
        cart.add(u1, &part("Féktárcsa", 24_500), 2).unwrap();

        let snapshot = cart.rebind(u2);
        assert!(snapshot.is_empty());

        cart.add(u2, &part("Olajszűrő", 4500), 1).unwrap();
        let back = cart.rebind(u1);
        assert_eq!(back.lines.len(), 1);
        assert_eq!(back.total_item_count(), 2);
    }

    #[test]
    fn test_identity_switch_reloads_wholesale() {
        // The worked example: u1 builds up a cart, a guest session shows
        // the guest slot, switching back restores u1's lines.
        let store = Arc::new(MemoryStore::new());
        let u1 = OwnerKey::User(UserId::generate());
        let cart = CartCache::new(store, u1);
        let p1 = part("Féktárcsa", 100);

        cart.add(u1, &p1, 2).unwrap();
        let snapshot = cart.add(u1, &p1, 1).unwrap();
        assert_eq!(snapshot.lines.first().unwrap().quantity, 3);

        assert!(cart.rebind(OwnerKey::Guest).is_empty());

        let restored = cart.rebind(u1);
        assert_eq!(restored.lines.first().unwrap().quantity, 3);
    }

    #[test]
    fn test_stale_mutation_is_discarded_with_distinct_signal() {
        let (_, u1, cart) = user_cart();
        let brake = part("Féktárcsa", 24_500);
        cart.add(u1, &brake, 1).unwrap();

        // Logout lands before the in-flight add resolves.
        cart.rebind(OwnerKey::Guest);
        assert_eq!(cart.add(u1, &brake, 1), Err(CartError::Superseded));
        assert!(cart.snapshot().is_empty());

        // The stale write also never leaks into the slot u1 reloads from.
        let restored = cart.rebind(u1);
        assert_eq!(restored.total_item_count(), 1);
    }

    #[test]
    fn test_clear_empties_and_deletes_slot_idempotently() {
        let (store, owner, cart) = user_cart();
        let key = owner.slot_key(CART_PREFIX);
        cart.add(owner, &part("Féktárcsa", 24_500), 2).unwrap();
        assert!(store.contains(&key));

        assert!(cart.clear(owner).unwrap().is_empty());
        assert!(!store.contains(&key));

        // Second clear stays empty and the slot stays gone.
        assert!(cart.clear(owner).unwrap().is_empty());
        assert!(!store.contains(&key));

        let reloaded = CartCache::new(store, owner);
        assert!(reloaded.snapshot().is_empty());
    }

    #[test]
    fn test_remove_to_empty_differs_from_clear_in_storage() {
        let (store, owner, cart) = user_cart();
        let brake = part("Féktárcsa", 24_500);
        let key = owner.slot_key(CART_PREFIX);

        cart.add(owner, &brake, 1).unwrap();
        cart.remove(owner, brake.id).unwrap();
        assert!(store.contains(&key), "remove keeps an empty slot");

        cart.clear(owner).unwrap();
        assert!(!store.contains(&key), "clear deletes the slot");
    }

    #[test]
    fn test_corrupt_slot_loads_as_empty_cart() {
        let store = Arc::new(MemoryStore::new());
        let owner = OwnerKey::User(UserId::generate());
        store
            .save(&owner.slot_key(CART_PREFIX), "{definitely not json")
            .unwrap();

        let cart = CartCache::new(store, owner);
        assert!(cart.snapshot().is_empty());

        // And the cart is fully usable afterwards.
        cart.add(owner, &part("Féktárcsa", 24_500), 1).unwrap();
        assert_eq!(cart.total_item_count(), 1);
    }

    #[test]
    fn test_watchers_observe_every_change() {
        let (_, owner, cart) = user_cart();
        let mut changes = cart.changes();
        assert!(changes.borrow_and_update().is_empty());

        cart.add(owner, &part("Féktárcsa", 24_500), 2).unwrap();
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().total_item_count(), 2);

        cart.rebind(OwnerKey::Guest);
        assert!(changes.has_changed().unwrap());
        let current = changes.borrow_and_update().clone();
        assert_eq!(current.owner, OwnerKey::Guest);
        assert!(current.is_empty());
    }

    #[test]
    fn test_subtotal_sums_line_totals() {
        let (_, owner, cart) = user_cart();
        cart.add(owner, &part("Féktárcsa", 24_500), 2).unwrap();
        let snapshot = cart.add(owner, &part("Olajszűrő", 4500), 1).unwrap();
        assert_eq!(snapshot.subtotal(), Decimal::new(53_500, 0));
    }
}
