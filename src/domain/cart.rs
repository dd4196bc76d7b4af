use bigdecimal::{BigDecimal, RoundingMode, Zero};
use serde::{Deserialize, Serialize};

use super::errors::CartError;

pub type ItemId = i64;

/// One distinct `(item_id, variant)` selection. At most one line per pair
/// exists in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Price captured when the line was added; never re-priced.
    pub unit_price: BigDecimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

impl CartLine {
    fn matches(&self, item_id: ItemId, variant: Option<&str>) -> bool {
        self.item_id == item_id && self.variant.as_deref() == variant
    }

    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

/// Ordered collection of cart lines. Persisted as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from previously persisted lines, dropping anything that
    /// violates the line invariants and merging duplicate keys.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Cart::new();
        for line in lines {
            if line.quantity == 0 || line.unit_price <= BigDecimal::zero() {
                log::warn!("Dropping invalid persisted cart line for item {}", line.item_id);
                continue;
            }
            let note = line.special_requests.clone();
            let variant = line.variant.clone();
            if cart
                .add(line.item_id, variant.as_deref(), line.unit_price, line.quantity)
                .is_ok()
            {
                if let Some(note) = note {
                    cart.set_special_requests(line.item_id, variant.as_deref(), Some(&note));
                }
            }
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn get(&self, item_id: ItemId, variant: Option<&str>) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(item_id, variant))
    }

    /// Merges into an existing `(item_id, variant)` line or appends a new one.
    /// The unit price of an existing line is kept as first captured.
    pub fn add(
        &mut self,
        item_id: ItemId,
        variant: Option<&str>,
        unit_price: BigDecimal,
        quantity: u32,
    ) -> Result<(), CartError> {
        if unit_price <= BigDecimal::zero() {
            return Err(CartError::InvalidPrice(unit_price));
        }
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.matches(item_id, variant)) {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or(CartError::InvalidQuantity(i64::from(line.quantity) + i64::from(quantity)))?;
            return Ok(());
        }

        self.lines.push(CartLine {
            item_id,
            variant: variant.map(str::to_string),
            unit_price,
            quantity,
            special_requests: None,
        });
        Ok(())
    }

    /// Sets a line's quantity exactly; zero or negative removes the line.
    /// Returns whether the cart changed.
    pub fn set_quantity(
        &mut self,
        item_id: ItemId,
        variant: Option<&str>,
        new_quantity: i64,
    ) -> Result<bool, CartError> {
        if new_quantity <= 0 {
            return Ok(self.remove(item_id, variant));
        }
        let quantity =
            u32::try_from(new_quantity).map_err(|_| CartError::InvalidQuantity(new_quantity))?;

        match self.lines.iter_mut().find(|l| l.matches(item_id, variant)) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Attaches a note to a line; a blank or missing note clears it.
    /// Returns whether a matching line was found.
    pub fn set_special_requests(
        &mut self,
        item_id: ItemId,
        variant: Option<&str>,
        note: Option<&str>,
    ) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.matches(item_id, variant)) else {
            return false;
        };
        line.special_requests = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        true
    }

    /// Returns whether a line was removed.
    pub fn remove(&mut self, item_id: ItemId, variant: Option<&str>) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(item_id, variant));
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total_item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Exact sum of `unit_price * quantity`; no intermediate rounding.
    pub fn total(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::zero(), |acc, line| acc + line.line_total())
    }
}

/// Rounds an amount to cents for display.
pub fn display_amount(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}
