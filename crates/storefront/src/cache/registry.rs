//! Per-device registry of cache pairs.
//!
//! Each browser gets a device id in its session and, through the registry,
//! its own [`CartCache`] and [`CompareCache`] backed by a slot directory of
//! its own. Idle devices are evicted from memory; that is safe because
//! every mutation persists synchronously, so the next access rebuilds the
//! same state from the slots.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use uuid::Uuid;

use pitstop_core::OwnerKey;

use super::cart::CartCache;
use super::compare::CompareCache;
use super::store::{FileStore, SlotStore};

/// The cart and compare list of one device, always bound to the same owner.
#[derive(Debug)]
pub struct DeviceCaches {
    pub cart: CartCache,
    pub compare: CompareCache,
}

impl DeviceCaches {
    fn new(store: Arc<dyn SlotStore>, owner: OwnerKey) -> Self {
        Self {
            cart: CartCache::new(store.clone(), owner),
            compare: CompareCache::new(store, owner),
        }
    }

    /// Deliver an identity change to both containers.
    pub fn rebind(&self, owner: OwnerKey) {
        self.cart.rebind(owner);
        self.compare.rebind(owner);
    }
}

/// Registry handing out the cache pair for a device id.
#[derive(Clone)]
pub struct CacheRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    root: PathBuf,
    devices: Cache<Uuid, Arc<DeviceCaches>>,
}

impl CacheRegistry {
    /// Create a registry whose slot files live under `root`, one
    /// subdirectory per device.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        let devices = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(Duration::from_secs(3600)) // 1 hour
            .build();

        Self {
            inner: Arc::new(RegistryInner { root, devices }),
        }
    }

    /// The cache pair for `device_id`, bound to `owner`.
    ///
    /// A pair that outlived its session (or was rebuilt after eviction
    /// while the visitor stayed signed in) is rebound here, so the returned
    /// pair always reflects the caller's identity.
    pub fn device(&self, device_id: Uuid, owner: OwnerKey) -> Arc<DeviceCaches> {
        let caches = self.inner.devices.get_with(device_id, || {
            let store: Arc<dyn SlotStore> =
                Arc::new(FileStore::new(self.inner.root.join(device_id.to_string())));
            Arc::new(DeviceCaches::new(store, owner))
        });

        if caches.cart.owner() != owner || caches.compare.owner() != owner {
            caches.rebind(owner);
        }
        caches
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("root", &self.inner.root)
            .field("devices", &self.inner.devices.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::part::PartSummary;
    use pitstop_core::{PartId, UserId};
    use rust_decimal::Decimal;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("pitstop-registry-{}", Uuid::new_v4()))
    }

    fn part(name: &str) -> PartSummary {
        PartSummary {
            id: PartId::generate(),
            name: name.into(),
            category: "Futómű".into(),
            brand: "Sachs".into(),
            price: Decimal::new(18_900, 0),
            image_url: None,
            description: None,
        }
    }

    #[test]
    fn test_same_device_gets_the_same_pair() {
        let registry = CacheRegistry::new(scratch_root());
        let device = Uuid::new_v4();

        let first = registry.device(device, OwnerKey::Guest);
        let second = registry.device(device, OwnerKey::Guest);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_devices_do_not_share_slots() {
        let root = scratch_root();
        let registry = CacheRegistry::new(root.clone());
        let (d1, d2) = (Uuid::new_v4(), Uuid::new_v4());

        let first = registry.device(d1, OwnerKey::Guest);
        first.compare.add(OwnerKey::Guest, &part("Féktárcsa")).unwrap();

        let second = registry.device(d2, OwnerKey::Guest);
        assert!(second.compare.snapshot().is_empty());

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_access_with_new_owner_rebinds_the_pair() {
        let root = scratch_root();
        let registry = CacheRegistry::new(root.clone());
        let device = Uuid::new_v4();
        let user = OwnerKey::User(UserId::generate());

        let caches = registry.device(device, OwnerKey::Guest);
        caches.compare.add(OwnerKey::Guest, &part("Olajszűrő")).unwrap();

        let rebound = registry.device(device, user);
        assert_eq!(rebound.cart.owner(), user);
        assert_eq!(rebound.compare.owner(), user);
        assert!(rebound.compare.snapshot().is_empty());

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_state_survives_a_fresh_registry() {
        let root = scratch_root();
        let device = Uuid::new_v4();
        let user = OwnerKey::User(UserId::generate());

        {
            let registry = CacheRegistry::new(root.clone());
            let caches = registry.device(device, user);
            caches.cart.add(user, &part("Lengéscsillapító"), 2).unwrap();
        }

        // A process restart builds everything back from the slot files.
        let registry = CacheRegistry::new(root.clone());
        let caches = registry.device(device, user);
        assert_eq!(caches.cart.total_item_count(), 2);

        let _ = std::fs::remove_dir_all(root);
    }
}
