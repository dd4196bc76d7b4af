use crate::domain::access::{require, Capability, Session};
use crate::domain::errors::OrderError;
use crate::domain::order::{OrderStatus, OrderView};
use crate::domain::ports::OrderGateway;

/// Status changes on orders that already exist in the Order Service.
pub struct OrderService<G> {
    gateway: G,
}

impl<G: OrderGateway> OrderService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub async fn get_order(&self, id: &str) -> Result<Option<OrderView>, OrderError> {
        Ok(self.gateway.get_order(id).await?)
    }

    /// Customer-initiated cancel, allowed only while the kitchen has not
    /// started on the order.
    pub async fn cancel_order(&self, session: &Session, id: &str) -> Result<OrderView, OrderError> {
        require(session, Capability::CancelPendingOrder)?;
        let order = self.gateway.get_order(id).await?.ok_or(OrderError::NotFound)?;
        if !order.status.customer_can_cancel() {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }
        let updated = self.gateway.update_status(id, OrderStatus::Cancelled).await?;
        log::info!("Order {} cancelled by {}", id, session.user_id);
        Ok(updated)
    }

    /// Kitchen/admin status advance.
    pub async fn update_status(
        &self,
        session: &Session,
        id: &str,
        next: OrderStatus,
    ) -> Result<OrderView, OrderError> {
        require(session, Capability::UpdateOrderStatus)?;
        let order = self.gateway.get_order(id).await?.ok_or(OrderError::NotFound)?;
        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }
        let updated = self.gateway.update_status(id, next).await?;
        log::info!("Order {} moved {} -> {} by {}", id, order.status, next, session.user_id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::{AccessError, Role};
    use crate::domain::errors::GatewayError;
    use crate::domain::order::{CreatedOrder, CustomerInfo, OrderRequest};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeOrders {
        orders: Mutex<HashMap<String, OrderStatus>>,
    }

    impl FakeOrders {
        fn with(id: &str, status: OrderStatus) -> Self {
            let fake = Self::default();
            fake.orders.lock().unwrap().insert(id.to_string(), status);
            fake
        }

        fn view(id: &str, status: OrderStatus) -> OrderView {
            OrderView {
                id: id.to_string(),
                status,
                total: "10.00".parse().unwrap(),
                customer: CustomerInfo::new("Ana", "555"),
                items: vec![],
                notes: None,
                created_at: "2026-10-16T12:00:00Z".to_string(),
            }
        }
    }

    #[async_trait]
    impl OrderGateway for FakeOrders {
        async fn create_order(
            &self,
            _request: &OrderRequest,
            _key: &str,
        ) -> Result<CreatedOrder, GatewayError> {
            Err(GatewayError::Network("unused".into()))
        }

        async fn get_order(&self, id: &str) -> Result<Option<OrderView>, GatewayError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .get(id)
                .map(|status| Self::view(id, *status)))
        }

        async fn update_status(
            &self,
            id: &str,
            status: OrderStatus,
        ) -> Result<OrderView, GatewayError> {
            self.orders.lock().unwrap().insert(id.to_string(), status);
            Ok(Self::view(id, status))
        }
    }

    fn customer() -> Session {
        Session::new("c1", Role::Customer)
    }

    fn cook() -> Session {
        Session::new("k1", Role::Kitchen)
    }

    #[tokio::test]
    async fn customer_cancels_pending_order() {
        let service = OrderService::new(FakeOrders::with("7", OrderStatus::Pending));

        let view = service.cancel_order(&customer(), "7").await.unwrap();

        assert_eq!(view.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn customer_cannot_cancel_once_preparing() {
        let service = OrderService::new(FakeOrders::with("7", OrderStatus::Preparing));

        let err = service.cancel_order(&customer(), "7").await.unwrap_err();

        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Preparing,
                to: OrderStatus::Cancelled
            }
        ));
    }

    #[tokio::test]
    async fn cancel_of_unknown_order_is_not_found() {
        let service = OrderService::new(FakeOrders::default());
        assert!(matches!(
            service.cancel_order(&customer(), "404").await,
            Err(OrderError::NotFound)
        ));
    }

    #[tokio::test]
    async fn kitchen_advances_status_forward_only() {
        let service = OrderService::new(FakeOrders::with("1", OrderStatus::Pending));

        service.update_status(&cook(), "1", OrderStatus::Preparing).await.unwrap();
        service.update_status(&cook(), "1", OrderStatus::Ready).await.unwrap();
        let back = service.update_status(&cook(), "1", OrderStatus::Preparing).await;

        assert!(matches!(back, Err(OrderError::InvalidTransition { .. })));
        let current = service.get_order("1").await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Ready);
    }

    #[tokio::test]
    async fn customers_cannot_advance_status() {
        let service = OrderService::new(FakeOrders::with("1", OrderStatus::Pending));

        let err = service
            .update_status(&customer(), "1", OrderStatus::Preparing)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Access(AccessError::Forbidden(_))));
    }
}
