//! Durable local key-value slots backing cart and compare state.
//!
//! The store is deliberately primitive: synchronous `load`/`save`/`delete`
//! of opaque strings by key, device-local, persisted across restarts. Slot
//! keys are owner-scoped (`cart_guest`, `compare_<uuid>`, ...) and produced
//! by [`pitstop_core::OwnerKey::slot_key`], never from user input.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Errors from the slot store.
///
/// Callers in the cache layer treat every variant as non-fatal: unreadable
/// slots load as empty collections and failed writes are logged and dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error while reading or writing a slot.
    #[error("slot i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A device-local durable key-value store.
///
/// One instance per browser device; one entry per `"<prefix>_<owner>"` key.
pub trait SlotStore: Send + Sync + fmt::Debug {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the slot exists but cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the value cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the entry under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if an existing entry cannot be removed.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// File-backed slot store: one `<key>.json` file per slot under a
/// per-device directory.
///
/// The directory is created lazily on first write, so devices that never
/// put anything in a cart leave nothing on disk.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (typically `<cache_dir>/<device_id>`).
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SlotStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.slot_path(key), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory slot store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Whether any value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.slots().contains_key(key)
    }
}

impl SlotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.slots().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("pitstop-slots-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = scratch_dir();
        let store = FileStore::new(dir.clone());

        assert!(store.load("cart_guest").unwrap().is_none());
        store.save("cart_guest", "[]").unwrap();
        assert_eq!(store.load("cart_guest").unwrap().as_deref(), Some("[]"));

        store.delete("cart_guest").unwrap();
        assert!(store.load("cart_guest").unwrap().is_none());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_file_store_delete_missing_is_ok() {
        let store = FileStore::new(scratch_dir());
        assert!(store.delete("cart_guest").is_ok());
    }

    #[test]
    fn test_file_store_keys_are_independent() {
        let dir = scratch_dir();
        let store = FileStore::new(dir.clone());

        store.save("cart_a", "1").unwrap();
        store.save("cart_b", "2").unwrap();
        store.delete("cart_a").unwrap();
        assert_eq!(store.load("cart_b").unwrap().as_deref(), Some("2"));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.save("compare_guest", "[]").unwrap();
        assert!(store.contains("compare_guest"));
        store.delete("compare_guest").unwrap();
        assert!(!store.contains("compare_guest"));
        assert!(store.load("compare_guest").unwrap().is_none());
    }
}
