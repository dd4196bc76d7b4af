use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::cart::{Cart, CartLine};
use crate::domain::errors::StorageError;
use crate::domain::ports::CartStorage;

pub const DEFAULT_CART_KEY: &str = "cart";

/// Reads a persisted cart. Unreadable lines are dropped one by one; a
/// document that is not an array at all yields an empty cart.
fn decode(raw: &str) -> Cart {
    let entries = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Discarding unparsable persisted cart: {}", e);
            return Cart::new();
        }
    };
    let lines = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<CartLine>(entry) {
            Ok(line) => Some(line),
            Err(e) => {
                log::warn!("Dropping unreadable cart line: {}", e);
                None
            }
        })
        .collect();
    Cart::from_lines(lines)
}

/// Keeps the cart as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Cart {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Cart::new(),
            Err(e) => {
                log::warn!("Could not read cart from {}: {}", self.path.display(), e);
                Cart::new()
            }
        }
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// reader never observes a half-written cart.
    fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec(cart)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process storage; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCartStorage {
    /// Seeds the slot with a raw value, as if written by an earlier session.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Cart {
        self.raw().as_deref().map(decode).unwrap_or_default()
    }

    fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        let raw = serde_json::to_string(cart)?;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("cart-storage-{}", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_is_an_empty_cart() {
        let storage = FileCartStorage::new(scratch_dir(), DEFAULT_CART_KEY);
        assert!(storage.load().is_empty());
    }

    #[test]
    fn file_round_trip_preserves_lines() {
        let dir = scratch_dir();
        let storage = FileCartStorage::new(&dir, "session-1");
        let mut cart = Cart::new();
        cart.add(2, None, "5.50".parse().unwrap(), 3).unwrap();

        storage.save(&cart).unwrap();

        assert_eq!(storage.path(), dir.join("session-1.json"));
        assert_eq!(storage.load(), cart);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn corrupt_file_is_an_empty_cart() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cart.json"), "{not json").unwrap();

        let storage = FileCartStorage::new(&dir, DEFAULT_CART_KEY);
        assert!(storage.load().is_empty());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn memory_storage_treats_garbage_as_empty() {
        assert!(MemoryCartStorage::with_raw("null").load().is_empty());
        assert!(MemoryCartStorage::with_raw("[{\"itemId\":1}]").load().is_empty());
        assert!(MemoryCartStorage::default().load().is_empty());
    }

    #[test]
    fn one_bad_line_does_not_discard_the_rest() {
        let storage = MemoryCartStorage::with_raw(
            r#"[
                {"itemId": 1, "unitPrice": "4.00", "quantity": 2},
                {"itemId": 2, "unitPrice": "1.00", "quantity": -1},
                {"itemId": 3},
                {"itemId": 4, "variant": "large", "unitPrice": "2.50", "quantity": 1}
            ]"#,
        );

        let cart = storage.load();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[0].item_id, 1);
        assert_eq!(cart.lines()[1].variant.as_deref(), Some("large"));
        assert_eq!(cart.total(), "10.50".parse::<bigdecimal::BigDecimal>().unwrap());
    }

    #[test]
    fn last_write_wins_between_handles() {
        let first = MemoryCartStorage::default();
        let second = first.clone();
        let mut a = Cart::new();
        a.add(1, None, "1.00".parse().unwrap(), 1).unwrap();
        let mut b = Cart::new();
        b.add(2, None, "2.00".parse().unwrap(), 2).unwrap();

        first.save(&a).unwrap();
        second.save(&b).unwrap();

        assert_eq!(first.load(), b);
    }
}
