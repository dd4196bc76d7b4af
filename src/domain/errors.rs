use bigdecimal::BigDecimal;
use thiserror::Error;

use super::access::AccessError;
use super::order::OrderStatus;

/// Input rejected at the cart boundary; the cart is left unchanged.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Unit price must be positive, got {0}")]
    InvalidPrice(BigDecimal),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),
    #[error("Menu item {0} is not available")]
    Unavailable(i64),
}

/// Local checkout validation; never reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("EMPTY_CART")]
    EmptyCart,
    #[error("MISSING_CUSTOMER_INFO")]
    MissingCustomerInfo,
}

/// Failure talking to the Order or Catalog Service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Server { status: u16, message: Option<String> },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
