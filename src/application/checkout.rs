use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::application::cart_store::{lock, CartStore};
use crate::domain::errors::{GatewayError, ValidationError};
use crate::domain::order::{CustomerInfo, OrderRequest, OrderStatus};
use crate::domain::ports::{CartStorage, OrderGateway};

const NETWORK_MESSAGE: &str = "We couldn't reach the restaurant. Please try again.";
const SERVER_FALLBACK_MESSAGE: &str = "The order could not be placed. Please try again.";

/// Why a submission that reached the network did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    Network,
    Server { status: Option<u16>, message: String },
}

impl SubmitFailure {
    fn from_gateway(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(_) => SubmitFailure::Network,
            GatewayError::Server { status, message } => SubmitFailure::Server {
                status: Some(status),
                message: message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| SERVER_FALLBACK_MESSAGE.to_string()),
            },
            GatewayError::InvalidResponse(_) => SubmitFailure::Server {
                status: None,
                message: SERVER_FALLBACK_MESSAGE.to_string(),
            },
        }
    }

    /// Text suitable for an inline checkout error.
    pub fn user_message(&self) -> &str {
        match self {
            SubmitFailure::Network => NETWORK_MESSAGE,
            SubmitFailure::Server { message, .. } => message,
        }
    }
}

/// What the confirmation view needs after a created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub order_id: String,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Submitting,
    Succeeded(Confirmation),
    Rejected(ValidationError),
    Failed(SubmitFailure),
}

/// Holds the single in-flight slot for one attempt. Dropping it frees the
/// slot; an attempt dropped before it settled leaves the flow `Idle`.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    state: &'a Mutex<SubmissionState>,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            log::info!("Checkout abandoned before the Order Service answered");
            *self.state.lock().unwrap_or_else(PoisonError::into_inner) = SubmissionState::Idle;
        }
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives one checkout attempt at a time from cart to confirmed order.
///
/// The cart is cleared only after the Order Service confirms creation; any
/// failure leaves it exactly as the submission found it.
pub struct CheckoutFlow<G> {
    gateway: G,
    in_flight: AtomicBool,
    state: Mutex<SubmissionState>,
}

impl<G: OrderGateway> CheckoutFlow<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Whether the checkout control should be enabled.
    pub fn can_submit<S: CartStorage>(&self, cart: &Mutex<CartStore<S>>) -> bool {
        !self.in_flight.load(Ordering::Acquire) && !lock(cart).is_empty()
    }

    fn set_state(&self, state: SubmissionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Runs one attempt and returns its outcome. A call made while another
    /// attempt is in flight returns `Submitting` without touching the network.
    pub async fn submit<S: CartStorage>(
        &self,
        cart: &Mutex<CartStore<S>>,
        customer: &CustomerInfo,
        notes: Option<&str>,
    ) -> SubmissionState {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Ignoring submit while an order is in flight");
            return SubmissionState::Submitting;
        }
        let mut slot = InFlight {
            flag: &self.in_flight,
            state: &self.state,
            settled: false,
        };

        let outcome = self.run(cart, customer, notes).await;

        if let SubmissionState::Rejected(_) = outcome {
            self.set_state(SubmissionState::Idle);
        } else {
            self.set_state(outcome.clone());
        }
        slot.settled = true;
        outcome
    }

    async fn run<S: CartStorage>(
        &self,
        cart: &Mutex<CartStore<S>>,
        customer: &CustomerInfo,
        notes: Option<&str>,
    ) -> SubmissionState {
        self.set_state(SubmissionState::Validating);

        // Snapshot under the lock; the guard is dropped before the await.
        let request = {
            let store = lock(cart);
            if store.is_empty() {
                log::info!("Checkout rejected: cart is empty");
                return SubmissionState::Rejected(ValidationError::EmptyCart);
            }
            if !customer.has_required_fields() {
                log::info!("Checkout rejected: missing customer name or phone");
                return SubmissionState::Rejected(ValidationError::MissingCustomerInfo);
            }
            OrderRequest::from_cart(&store.snapshot(), customer, notes)
        };

        self.set_state(SubmissionState::Submitting);
        let idempotency_key = Uuid::new_v4().to_string();
        log::debug!(
            "Submitting order with {} line(s), key {}",
            request.items.len(),
            idempotency_key
        );

        match self.gateway.create_order(&request, &idempotency_key).await {
            Ok(created) => {
                log::info!(
                    "Order {} created ({})",
                    created.id,
                    created.status.map_or("status not reported", OrderStatus::as_str)
                );
                lock(cart).clear();
                SubmissionState::Succeeded(Confirmation {
                    order_id: created.id,
                    total: created.total.unwrap_or_else(|| request.total()),
                })
            }
            Err(e) => {
                log::error!("Order submission failed: {}", e);
                SubmissionState::Failed(SubmitFailure::from_gateway(e))
            }
        }
    }
}
