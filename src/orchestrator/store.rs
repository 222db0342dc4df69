//! Persistence slot for the serialized cart.
//!
//! A store holds one opaque blob under a named key. `FileStore` maps the key
//! to `<dir>/<key>.json`; `MemoryStore` keeps blobs in a map and is what the
//! tests use.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::cart::Cart;
use crate::errors::StoreError;

/// Default slot name.
pub const DEFAULT_STORE_KEY: &str = "cartState";

pub trait CartStore: Send + Sync {
    /// The raw blob, or `None` if the slot was never written.
    fn load(&self) -> Result<Option<String>, StoreError>;

    fn save(&self, blob: &str) -> Result<(), StoreError>;

    /// Empty the slot. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

pub fn encode(cart: &Cart) -> Result<String, StoreError> {
    serde_json::to_string(cart).map_err(StoreError::Serialize)
}

pub fn decode(blob: &str) -> Result<Cart, StoreError> {
    serde_json::from_str(blob).map_err(StoreError::Malformed)
}

/// One JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|source| StoreError::ReadFailed {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        let write_failed = |source: std::io::Error| StoreError::WriteFailed {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        // Write to a sibling temp file, then rename over the target.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob).map_err(write_failed)?;
        fs::rename(&tmp, &self.path).map_err(write_failed)
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|source| StoreError::WriteFailed {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// In-memory slots, keyed by name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    key: String,
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// A store whose slot already holds `blob`.
    pub fn with_blob(key: &str, blob: &str) -> Self {
        let store = Self::new(key);
        if let Ok(mut slots) = store.slots.lock() {
            slots.insert(key.to_string(), blob.to_string());
        }
        store
    }
}

impl CartStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let slots = self.slots.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(slots.get(&self.key).cloned())
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().map_err(|_| StoreError::LockPoisoned)?;
        slots.insert(self.key.clone(), blob.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().map_err(|_| StoreError::LockPoisoned)?;
        slots.remove(&self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartAction, CartItem, CartMachine};
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn sample_cart() -> Cart {
        let machine = CartMachine::default();
        let item = CartItem::new("p1", "Headphones", Decimal::new(5999, 2), 2, "img").unwrap();
        let cart = machine.transition(&machine.initial(), CartAction::AddItem(item));
        machine.transition(&cart, CartAction::ApplyDiscount("SAVE10".into()))
    }

    #[test]
    fn test_file_store_empty_returns_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), DEFAULT_STORE_KEY);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), DEFAULT_STORE_KEY);
        let cart = sample_cart();

        store.save(&encode(&cart).unwrap()).unwrap();
        let blob = store.load().unwrap().unwrap();
        assert_eq!(decode(&blob).unwrap(), cart);
        assert_eq!(store.path(), dir.path().join("cartState.json"));
    }

    #[test]
    fn test_file_store_creates_missing_dir() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(&dir.path().join("nested/deeper"), "k");
        store.save("{}").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_survives_restart() {
        let dir = tempdir().unwrap();
        let cart = sample_cart();
        {
            let store = FileStore::new(dir.path(), "cart");
            store.save(&encode(&cart).unwrap()).unwrap();
        }
        {
            let store = FileStore::new(dir.path(), "cart");
            let blob = store.load().unwrap().unwrap();
            assert_eq!(decode(&blob).unwrap(), cart);
        }
    }

    #[test]
    fn test_file_store_clear() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), "cart");
        store.clear().unwrap();
        store.save("{}").unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_keys_are_separate() {
        let a = MemoryStore::with_blob("a", "{}");
        assert_eq!(a.load().unwrap().as_deref(), Some("{}"));
        let b = MemoryStore::new("b");
        assert!(b.load().unwrap().is_none());
    }

    #[test]
    fn test_decode_rejects_corrupt_blob() {
        assert!(matches!(
            decode("{\"items\": 12"),
            Err(StoreError::Malformed(_))
        ));
        assert!(matches!(
            decode("{\"items\": [{\"id\": 5}]}"),
            Err(StoreError::Malformed(_))
        ));
    }
}
