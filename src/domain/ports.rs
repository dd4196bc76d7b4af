use async_trait::async_trait;

use super::cart::Cart;
use super::catalog::MenuItem;
use super::errors::{GatewayError, StorageError};
use super::order::{CreatedOrder, OrderRequest, OrderStatus, OrderView};

/// Durable key-value home of the serialized cart.
pub trait CartStorage: Send + 'static {
    /// Missing or unparsable data yields an empty cart, not an error.
    fn load(&self) -> Cart;
    fn save(&self, cart: &Cart) -> Result<(), StorageError>;
}

#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
    async fn create_order(
        &self,
        request: &OrderRequest,
        idempotency_key: &str,
    ) -> Result<CreatedOrder, GatewayError>;
    async fn get_order(&self, id: &str) -> Result<Option<OrderView>, GatewayError>;
    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<OrderView, GatewayError>;
}

#[async_trait]
pub trait CatalogGateway: Send + Sync + 'static {
    async fn list_menu(&self) -> Result<Vec<MenuItem>, GatewayError>;
}
