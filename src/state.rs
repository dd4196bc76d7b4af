//! In-memory order book behind the development Order Service.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use uuid::Uuid;

use crate::domain::catalog::MenuItem;
use crate::domain::order::{CreatedOrder, OrderRequest, OrderStatus, OrderView};
use crate::errors::AppError;

#[derive(Default)]
struct OrderBook {
    /// Insertion order doubles as creation order.
    orders: Vec<OrderView>,
    by_key: HashMap<String, String>,
}

pub struct AppState {
    menu: Vec<MenuItem>,
    book: Mutex<OrderBook>,
}

impl AppState {
    pub fn new(menu: Vec<MenuItem>) -> Self {
        Self {
            menu,
            book: Mutex::new(OrderBook::default()),
        }
    }

    /// A small starter menu for local runs.
    pub fn seeded() -> Self {
        let item = |id, name: &str, price: &str, category: &str| MenuItem {
            id,
            name: name.to_string(),
            price: price.parse().unwrap_or_else(|_| BigDecimal::zero()),
            description: None,
            category: category.to_string(),
            image_url: None,
            is_available: true,
        };
        Self::new(vec![
            item(1, "Margherita Pizza", "12.99", "main"),
            item(2, "Garlic Bread", "5.50", "appetizer"),
            item(3, "Caesar Salad", "8.75", "appetizer"),
            item(4, "Tiramisu", "6.25", "dessert"),
        ])
    }

    fn book(&self) -> MutexGuard<'_, OrderBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn menu(&self) -> &[MenuItem] {
        &self.menu
    }

    fn validate(&self, request: &OrderRequest) -> Result<(), AppError> {
        if !request.customer.has_required_fields() {
            return Err(AppError::BadRequest(
                "Name and phone number are required".to_string(),
            ));
        }
        if request.items.is_empty() {
            return Err(AppError::BadRequest("No items in order".to_string()));
        }
        for line in &request.items {
            if line.quantity == 0 || line.unit_price <= BigDecimal::zero() {
                return Err(AppError::BadRequest(format!(
                    "Invalid quantity or price for item {}",
                    line.item_id
                )));
            }
            let available = self
                .menu
                .iter()
                .any(|m| m.id == line.item_id && m.is_available);
            if !available {
                return Err(AppError::BadRequest(format!(
                    "Menu item {} is not available",
                    line.item_id
                )));
            }
        }
        Ok(())
    }

    /// Creates a pending order. A repeated idempotency key returns the order
    /// first created for it; the flag reports whether this call created it.
    pub fn create_order(
        &self,
        request: OrderRequest,
        idempotency_key: Option<&str>,
    ) -> Result<(CreatedOrder, bool), AppError> {
        self.validate(&request)?;
        let mut book = self.book();

        if let Some(existing) = idempotency_key
            .and_then(|key| book.by_key.get(key))
            .and_then(|id| book.orders.iter().find(|o| &o.id == id))
        {
            return Ok((created(existing), false));
        }

        let total = request.total();
        let order = OrderView {
            id: Uuid::new_v4().to_string(),
            status: OrderStatus::Pending,
            total,
            customer: request.customer,
            items: request.items,
            notes: request.notes,
            created_at: Utc::now().to_rfc3339(),
        };
        if let Some(key) = idempotency_key {
            book.by_key.insert(key.to_string(), order.id.clone());
        }
        let response = created(&order);
        book.orders.push(order);
        Ok((response, true))
    }

    pub fn get_order(&self, id: &str) -> Option<OrderView> {
        self.book().orders.iter().find(|o| o.id == id).cloned()
    }

    /// Newest first.
    pub fn list_orders(&self, page: i64, limit: i64) -> (Vec<OrderView>, i64) {
        let book = self.book();
        let offset = usize::try_from(page.saturating_sub(1).saturating_mul(limit))
            .unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);
        let items = book
            .orders
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (items, book.orders.len() as i64)
    }

    pub fn update_status(&self, id: &str, next: OrderStatus) -> Result<OrderView, AppError> {
        let mut book = self.book();
        let order = book
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(AppError::NotFound)?;
        if !order.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Cannot move order from {} to {}",
                order.status, next
            )));
        }
        order.status = next;
        Ok(order.clone())
    }
}

fn created(order: &OrderView) -> CreatedOrder {
    CreatedOrder {
        id: order.id.clone(),
        status: Some(order.status),
        total: Some(order.total.clone()),
    }
}
