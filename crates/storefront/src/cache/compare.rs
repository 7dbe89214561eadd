//! Owner-scoped compare list.
//!
//! Same shape as the cart container, with two differences: guests may use
//! it, and it holds at most [`MAX_COMPARE_ITEMS`] distinct parts. A part
//! already on the list and a full list are rejected with distinct errors so
//! the UI can word the two cases differently.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use pitstop_core::{OwnerKey, PartId};

use super::store::SlotStore;
use crate::models::part::PartSummary;

/// Slot key prefix for compare collections.
pub const COMPARE_PREFIX: &str = "compare";

/// A comparison table wider than this stops being readable.
pub const MAX_COMPARE_ITEMS: usize = 3;

/// Point-in-time view of a compare list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareSnapshot {
    pub owner: OwnerKey,
    /// Distinct parts in insertion order, at most [`MAX_COMPARE_ITEMS`].
    pub parts: Vec<PartSummary>,
}

impl CompareSnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[must_use]
    pub fn contains(&self, part_id: PartId) -> bool {
        self.parts.iter().any(|part| part.id == part_id)
    }

    /// Whether another part would still fit.
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.parts.len() < MAX_COMPARE_ITEMS
    }
}

/// Rejected compare-list mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompareError {
    /// The part is already on the list; listing it twice says nothing.
    #[error("this part is already on the compare list")]
    AlreadyListed,

    /// The list is full. Checked after the duplicate case, so re-adding a
    /// listed part on a full list still reports [`Self::AlreadyListed`].
    #[error("the compare list holds at most {MAX_COMPARE_ITEMS} parts")]
    LimitReached,

    /// The identity changed under the caller; the write was discarded.
    #[error("compare list owner changed while the request was in flight")]
    Superseded,
}

struct Bound {
    owner: OwnerKey,
    parts: Vec<PartSummary>,
}

/// The compare-list state container for one device.
pub struct CompareCache {
    store: Arc<dyn SlotStore>,
    state: Mutex<Bound>,
    changes: watch::Sender<CompareSnapshot>,
}

impl CompareCache {
    /// Construct a compare list bound to `owner`, loading its stored parts.
    ///
    /// Unreadable slots load as an empty list, like the cart.
    #[must_use]
    pub fn new(store: Arc<dyn SlotStore>, owner: OwnerKey) -> Self {
        let parts = load_parts(store.as_ref(), owner);
        let (changes, _) = watch::channel(CompareSnapshot {
            owner,
            parts: parts.clone(),
        });
        Self {
            store,
            state: Mutex::new(Bound { owner, parts }),
            changes,
        }
    }

    /// The owner the list is currently bound to.
    #[must_use]
    pub fn owner(&self) -> OwnerKey {
        self.lock().owner
    }

    /// Current snapshot without mutating anything.
    #[must_use]
    pub fn snapshot(&self) -> CompareSnapshot {
        let state = self.lock();
        CompareSnapshot {
            owner: state.owner,
            parts: state.parts.clone(),
        }
    }

    /// Subscribe to snapshots, as [`CartCache::changes`] does.
    ///
    /// [`CartCache::changes`]: super::cart::CartCache::changes
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<CompareSnapshot> {
        self.changes.subscribe()
    }

    /// Switch the bound owner, replacing the collection wholesale.
    pub fn rebind(&self, owner: OwnerKey) -> CompareSnapshot {
        let mut state = self.lock();
        if state.owner != owner {
            debug!(from = %state.owner, to = %owner, "rebinding compare list");
            state.owner = owner;
            state.parts = load_parts(self.store.as_ref(), owner);
            return self.publish(&state);
        }
        CompareSnapshot {
            owner: state.owner,
            parts: state.parts.clone(),
        }
    }

    /// Put a part on the list. Guests may compare; no sign-in gate here.
    ///
    /// # Errors
    ///
    /// [`CompareError::Superseded`] when `origin` no longer matches the
    /// bound owner, [`CompareError::AlreadyListed`] for a part already on
    /// the list, then [`CompareError::LimitReached`] for a full list.
    pub fn add(
        &self,
        origin: OwnerKey,
        part: &PartSummary,
    ) -> Result<CompareSnapshot, CompareError> {
        let mut state = self.lock();
        if state.owner != origin {
            return Err(CompareError::Superseded);
        }
        if state.parts.iter().any(|listed| listed.id == part.id) {
            return Err(CompareError::AlreadyListed);
        }
        if state.parts.len() >= MAX_COMPARE_ITEMS {
            return Err(CompareError::LimitReached);
        }

        state.parts.push(part.clone());
        self.persist(&state);
        Ok(self.publish(&state))
    }

    /// Take a part off the list if present; a no-op otherwise.
    ///
    /// # Errors
    ///
    /// [`CompareError::Superseded`] when `origin` no longer matches the
    /// bound owner.
    pub fn remove(
        &self,
        origin: OwnerKey,
        part_id: PartId,
    ) -> Result<CompareSnapshot, CompareError> {
        let mut state = self.lock();
        if state.owner != origin {
            return Err(CompareError::Superseded);
        }

        state.parts.retain(|part| part.id != part_id);
        self.persist(&state);
        Ok(self.publish(&state))
    }

    /// Empty the list and delete its storage slot.
    ///
    /// # Errors
    ///
    /// [`CompareError::Superseded`] when `origin` no longer matches the
    /// bound owner.
    pub fn clear(&self, origin: OwnerKey) -> Result<CompareSnapshot, CompareError> {
        let mut state = self.lock();
        if state.owner != origin {
            return Err(CompareError::Superseded);
        }

        state.parts.clear();
        let key = state.owner.slot_key(COMPARE_PREFIX);
        if let Err(err) = self.store.delete(&key) {
            warn!(%key, error = %err, "failed to delete compare slot");
        }
        Ok(self.publish(&state))
    }

    fn lock(&self) -> MutexGuard<'_, Bound> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &Bound) {
        let key = state.owner.slot_key(COMPARE_PREFIX);
        match serde_json::to_string(&state.parts) {
            Ok(json) => {
                if let Err(err) = self.store.save(&key, &json) {
                    warn!(%key, error = %err, "failed to persist compare slot");
                }
            }
            Err(err) => warn!(%key, error = %err, "failed to serialize compare list"),
        }
    }

    fn publish(&self, state: &Bound) -> CompareSnapshot {
        let snapshot = CompareSnapshot {
            owner: state.owner,
            parts: state.parts.clone(),
        };
        self.changes.send_replace(snapshot.clone());
        snapshot
    }
}

impl std::fmt::Debug for CompareCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CompareCache")
            .field("owner", &state.owner)
            .field("parts", &state.parts.len())
            .finish_non_exhaustive()
    }
}

fn load_parts(store: &dyn SlotStore, owner: OwnerKey) -> Vec<PartSummary> {
    let key = owner.slot_key(COMPARE_PREFIX);
    match store.load(&key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|err| {
            warn!(%key, error = %err, "corrupt compare slot, starting empty");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(%key, error = %err, "unreadable compare slot, starting empty");
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
    use rust_decimal::Decimal;

    fn part(name: &str) -> PartSummary {
        PartSummary {
            id: PartId::generate(),
            name: name.into(),
            category: "Motor".into(),
            brand: "Mann".into(),
            price: Decimal::new(4500, 0),
            image_url: None,
            description: None,
        }
    }

    fn guest_list() -> (Arc<MemoryStore>, CompareCache) {
        let store = Arc::new(MemoryStore::new());
        let list = CompareCache::new(store.clone(), OwnerKey::Guest);
        (store, list)
    }

    #[test]
    fn test_guest_may_build_a_compare_list() {
        let (store, list) = guest_list();
        let snapshot = list.add(OwnerKey::Guest, &part("Olajszűrő")).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(store.contains("compare_guest"));
    }

    #[test]
    fn test_duplicate_part_is_rejected_distinctly() {
        let (_, list) = guest_list();
        let filter = part("Olajszűrő");
        list.add(OwnerKey::Guest, &filter).unwrap();

        assert_eq!(
            list.add(OwnerKey::Guest, &filter),
            Err(CompareError::AlreadyListed)
        );
        assert_eq!(list.snapshot().len(), 1);
    }

    #[test]
    fn test_fourth_part_is_rejected_and_list_unchanged() {
        let (_, list) = guest_list();
        for name in ["Féktárcsa", "Olajszűrő", "Gyújtógyertya"] {
            list.add(OwnerKey::Guest, &part(name)).unwrap();
        }
        let before = list.snapshot();
        assert!(!before.has_room());

        assert_eq!(
            list.add(OwnerKey::Guest, &part("Lengéscsillapító")),
            Err(CompareError::LimitReached)
        );
        assert_eq!(list.snapshot(), before);
    }

    #[test]
    fn test_duplicate_on_full_list_reports_already_listed() {
        let (_, list) = guest_list();
        let first = part("Féktárcsa");
        list.add(OwnerKey::Guest, &first).unwrap();
        list.add(OwnerKey::Guest, &part("Olajszűrő")).unwrap();
        list.add(OwnerKey::Guest, &part("Gyújtógyertya")).unwrap();

        assert_eq!(
            list.add(OwnerKey::Guest, &first),
            Err(CompareError::AlreadyListed)
        );
    }

    #[test]
    fn test_remove_frees_a_slot() {
        let (_, list) = guest_list();
        let first = part("Féktárcsa");
        list.add(OwnerKey::Guest, &first).unwrap();
        list.add(OwnerKey::Guest, &part("Olajszűrő")).unwrap();
        list.add(OwnerKey::Guest, &part("Gyújtógyertya")).unwrap();

        let snapshot = list.remove(OwnerKey::Guest, first.id).unwrap();
        assert!(snapshot.has_room());
        assert!(!snapshot.contains(first.id));

        list.add(OwnerKey::Guest, &part("Lengéscsillapító")).unwrap();
    }

    #[test]
    fn test_clear_deletes_the_slot() {
        let (store, list) = guest_list();
        list.add(OwnerKey::Guest, &part("Féktárcsa")).unwrap();
        assert!(store.contains("compare_guest"));

        assert!(list.clear(OwnerKey::Guest).unwrap().is_empty());
        assert!(!store.contains("compare_guest"));
    }

    #[test]
    fn test_rebind_keeps_guest_and_user_lists_apart() {
        let store = Arc::new(MemoryStore::new());
        let user = OwnerKey::User(UserId::generate());
        let list = CompareCache::new(store, OwnerKey::Guest);
        list.add(OwnerKey::Guest, &part("Féktárcsa")).unwrap();

        assert!(list.rebind(user).is_empty());
        list.add(user, &part("Olajszűrő")).unwrap();

        let guest_again = list.rebind(OwnerKey::Guest);
        assert_eq!(guest_again.len(), 1);
        assert_eq!(
            guest_again.parts.first().unwrap().name,
            "Féktárcsa".to_owned()
        );
    }

    #[test]
    fn test_stale_mutation_is_discarded() {
        let store = Arc::new(MemoryStore::new());
        let user = OwnerKey::User(UserId::generate());
        let list = CompareCache::new(store, user);

        list.rebind(OwnerKey::Guest);
        assert_eq!(
            list.add(user, &part("Féktárcsa")),
            Err(CompareError::Superseded)
        );
        assert!(list.snapshot().is_empty());
    }

    #[test]
    fn test_list_survives_reload() {
        let (store, list) = guest_list();
        list.add(OwnerKey::Guest, &part("Féktárcsa")).unwrap();
        list.add(OwnerKey::Guest, &part("Olajszűrő")).unwrap();

        let reloaded = CompareCache::new(store, OwnerKey::Guest);
        assert_eq!(reloaded.snapshot().parts, list.snapshot().parts);
    }

    #[test]
    fn test_corrupt_slot_loads_as_empty_list() {
        let store = Arc::new(MemoryStore::new());
        store.save("compare_guest", "[{\"id\": 12}").unwrap();

        let list = CompareCache::new(store, OwnerKey::Guest);
        assert!(list.snapshot().is_empty());
    }

    #[test]
    fn test_watchers_observe_adds_and_rebinds() {
        let (_, list) = guest_list();
        let mut changes = list.changes();
        assert!(changes.borrow_and_update().is_empty());

        list.add(OwnerKey::Guest, &part("Féktárcsa")).unwrap();
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().len(), 1);

        let user = OwnerKey::User(UserId::generate());
        list.rebind(user);
        assert_eq!(changes.borrow_and_update().owner, user);
    }
}
