use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bigdecimal::BigDecimal;

use crate::domain::cart::{display_amount, Cart, CartLine, ItemId};
use crate::domain::catalog::MenuItem;
use crate::domain::errors::CartError;
use crate::domain::ports::CartStorage;

/// Handle shared by every view of one session. Never hold the lock across
/// an `.await`.
pub type SharedCart<S> = Arc<Mutex<CartStore<S>>>;

/// Authoritative client-side cart. Every successful mutation is written
/// through to storage; storage failures are logged and otherwise ignored.
pub struct CartStore<S> {
    cart: Cart,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Restores whatever the storage holds.
    pub fn open(storage: S) -> Self {
        let cart = storage.load();
        log::debug!("Restored cart with {} line(s)", cart.len());
        Self { cart, storage }
    }

    pub fn shared(self) -> SharedCart<S> {
        Arc::new(Mutex::new(self))
    }

    pub fn add_item(
        &mut self,
        item_id: ItemId,
        variant: Option<&str>,
        unit_price: BigDecimal,
        quantity: u32,
    ) -> Result<(), CartError> {
        if let Err(e) = self.cart.add(item_id, variant, unit_price, quantity) {
            log::warn!("Rejected add of item {}: {}", item_id, e);
            return Err(e);
        }
        log::debug!("Added {} x item {} ({:?})", quantity, item_id, variant);
        self.persist();
        Ok(())
    }

    /// Adds a catalog entry at its current price.
    pub fn add_menu_item(
        &mut self,
        item: &MenuItem,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<(), CartError> {
        if !item.is_available {
            log::warn!("Rejected add of unavailable item {}", item.id);
            return Err(CartError::Unavailable(item.id));
        }
        self.add_item(item.id, variant, item.price.clone(), quantity)
    }

    /// Zero or negative quantities remove the line.
    pub fn update_quantity(
        &mut self,
        item_id: ItemId,
        variant: Option<&str>,
        new_quantity: i64,
    ) -> Result<(), CartError> {
        match self.cart.set_quantity(item_id, variant, new_quantity) {
            Ok(true) => {
                self.persist();
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                log::warn!("Rejected quantity update of item {}: {}", item_id, e);
                Err(e)
            }
        }
    }

    pub fn set_special_requests(&mut self, item_id: ItemId, variant: Option<&str>, note: Option<&str>) {
        if self.cart.set_special_requests(item_id, variant, note) {
            self.persist();
        }
    }

    pub fn remove_item(&mut self, item_id: ItemId, variant: Option<&str>) {
        if self.cart.remove(item_id, variant) {
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn total(&self) -> BigDecimal {
        self.cart.total()
    }

    /// Total rounded to cents, for presentation only.
    pub fn display_total(&self) -> BigDecimal {
        display_amount(&self.cart.total())
    }

    pub fn total_item_count(&self) -> u64 {
        self.cart.total_item_count()
    }

    /// Owned copy of the current contents.
    pub fn snapshot(&self) -> Cart {
        self.cart.clone()
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save(&self.cart) {
            log::warn!("Cart persistence failed, continuing in memory: {}", e);
        }
    }
}

/// Locks a shared cart, recovering the data if a previous holder panicked.
pub fn lock<S>(cart: &Mutex<CartStore<S>>) -> MutexGuard<'_, CartStore<S>> {
    cart.lock().unwrap_or_else(PoisonError::into_inner)
}
