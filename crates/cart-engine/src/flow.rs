//! # Checkout Flow Controller
//!
//! Ties one checkout together: snapshot validation, backend order creation,
//! option building, and the coordinated gateway payment. On success the cart
//! is cleared; on any failure or cancellation the cart is left intact so the
//! customer can retry.

use crate::coordinator::PaymentCoordinator;
use cart_core::{
    BoxedOptionsBuilder, BoxedOrderBackend, Cart, CheckoutSession, Customer, EngineError,
    EngineResult,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// The cart as shared by the caller surface and the flow. Locked only for
/// synchronous mutations and snapshots, never across a gateway await.
pub type SharedCart = Arc<Mutex<Cart>>;

/// Terminal result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    /// Gateway payment identifier
    pub payment_id: String,

    /// Backend-issued order id (also the gateway order id)
    pub order_id: String,

    /// Gateway signature over (order id, payment id), when provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Drives one checkout from cart snapshot to terminal outcome.
pub struct CheckoutFlow {
    backend: BoxedOrderBackend,
    builder: BoxedOptionsBuilder,
    coordinator: Arc<PaymentCoordinator>,
}

impl CheckoutFlow {
    pub fn new(
        backend: BoxedOrderBackend,
        builder: BoxedOptionsBuilder,
        coordinator: Arc<PaymentCoordinator>,
    ) -> Self {
        Self {
            backend,
            builder,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &PaymentCoordinator {
        &self.coordinator
    }

    /// Run a checkout for the cart's current contents.
    ///
    /// Operates on a snapshot taken up front; concurrent cart edits after
    /// that point do not affect the amount collected. The cart is cleared
    /// only on success.
    #[instrument(skip_all)]
    pub async fn checkout(
        &self,
        cart: &SharedCart,
        customer: Customer,
    ) -> EngineResult<CheckoutOutcome> {
        let snapshot = cart.lock().await.snapshot();
        if snapshot.is_empty() {
            return Err(EngineError::EmptyCart);
        }
        snapshot.verify_totals()?;
        customer.validate()?;

        let session = CheckoutSession::from_snapshot(&snapshot, customer);

        let order = self.backend.create_order(&session).await?;
        info!(order_id = %order.id, amount = session.amount.minor, "backend order created");

        let options = self.builder.build(&session, &order.id)?;
        let receipt = self.coordinator.process_payment(&options).await?;

        cart.lock().await.clear();
        info!(
            payment_id = %receipt.payment_id,
            order_id = %order.id,
            "checkout complete, cart cleared"
        );

        Ok(CheckoutOutcome {
            payment_id: receipt.payment_id,
            order_id: order.id,
            signature: receipt.signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::RetryPolicy;
    use async_trait::async_trait;
    use cart_core::{
        BackendOrder, CartLine, CheckoutOptions, CheckoutOptionsBuilder, Currency, GatewayReceipt,
        MemoryHistoryStore, Money, OrderBackend, PaymentGateway, RetryFlags, TaxRate,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct StubBackend {
        fail: bool,
        calls: AtomicU32,
    }

    impl StubBackend {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl OrderBackend for StubBackend {
        async fn create_order(&self, _session: &CheckoutSession) -> EngineResult<BackendOrder> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(EngineError::OrderCreationFailed(
                    "backend said no".to_string(),
                ))
            } else {
                Ok(BackendOrder {
                    id: "order_9".to_string(),
                })
            }
        }
    }

    struct StubBuilder;

    impl CheckoutOptionsBuilder for StubBuilder {
        fn build(
            &self,
            session: &CheckoutSession,
            gateway_order_id: &str,
        ) -> EngineResult<CheckoutOptions> {
            Ok(CheckoutOptions {
                key_id: "rzp_test_abc".to_string(),
                gateway_order_id: gateway_order_id.to_string(),
                amount_minor: session.amount.minor,
                currency: session.amount.currency,
                receipt: "rcpt_x".to_string(),
                prefill: session.customer.clone(),
                retry: RetryFlags::default(),
                notes: HashMap::new(),
            })
        }
    }

    struct StubGateway {
        outcome_code: &'static str,
        calls: AtomicU32,
    }

    impl StubGateway {
        fn new(outcome_code: &'static str) -> Self {
            Self {
                outcome_code,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn open_checkout(&self, options: &CheckoutOptions) -> EngineResult<GatewayReceipt> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome_code {
                "ok" => Ok(GatewayReceipt {
                    payment_id: "pay_5".to_string(),
                    order_id: Some(options.gateway_order_id.clone()),
                    signature: Some("sig".to_string()),
                }),
                "cancelled" => Err(EngineError::Cancelled),
                _ => Err(EngineError::NetworkError("reset".to_string())),
            }
        }

        fn gateway_name(&self) -> &'static str {
            "stub"
        }
    }

    fn cart_with_line() -> SharedCart {
        let mut cart = Cart::new(Currency::INR);
        cart.add_line(CartLine::new(
            "A1",
            "item A1",
            Money::new(100.0, Currency::INR),
            2,
            "S1",
            TaxRate::from_percent(5.0).unwrap(),
        ))
        .unwrap();
        Arc::new(Mutex::new(cart))
    }

    fn customer() -> Customer {
        Customer::new("Asha Rao", "asha@example.com", "+919800000001")
    }

    fn flow_with(backend: StubBackend, gateway: StubGateway) -> CheckoutFlow {
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = Arc::new(
            PaymentCoordinator::new(Arc::new(gateway), history).with_policy(RetryPolicy {
                max_retries: 0,
                backoff: Duration::from_millis(1),
            }),
        );
        CheckoutFlow::new(Arc::new(backend), Arc::new(StubBuilder), coordinator)
    }

    #[tokio::test]
    async fn test_successful_checkout_clears_cart() {
        let cart = cart_with_line();
        let flow = flow_with(StubBackend::ok(), StubGateway::new("ok"));

        let outcome = flow.checkout(&cart, customer()).await.unwrap();
        assert_eq!(outcome.payment_id, "pay_5");
        assert_eq!(outcome.order_id, "order_9");
        assert_eq!(outcome.signature.as_deref(), Some("sig"));

        assert!(cart.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_payment_leaves_cart_intact() {
        let cart = cart_with_line();
        let flow = flow_with(StubBackend::ok(), StubGateway::new("network"));

        let err = flow.checkout(&cart, customer()).await.unwrap_err();
        assert!(matches!(err, EngineError::NetworkError(_)));

        let guard = cart.lock().await;
        assert_eq!(guard.item_count(), 2);
        assert_eq!(guard.totals().grand_total, 21_000);
    }

    #[tokio::test]
    async fn test_cancelled_payment_leaves_cart_intact() {
        let cart = cart_with_line();
        let flow = flow_with(StubBackend::ok(), StubGateway::new("cancelled"));

        let err = flow.checkout(&cart, customer()).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert!(!cart.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_backend() {
        let cart = Arc::new(Mutex::new(Cart::new(Currency::INR)));

        let backend = Arc::new(StubBackend::ok());
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = Arc::new(PaymentCoordinator::new(
            Arc::new(StubGateway::new("ok")),
            history,
        ));
        let flow = CheckoutFlow::new(backend.clone(), Arc::new(StubBuilder), coordinator);

        let err = flow.checkout(&cart, customer()).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyCart));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_order_creation_failure_aborts_before_gateway() {
        let cart = cart_with_line();

        let gateway = Arc::new(StubGateway::new("ok"));
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = Arc::new(PaymentCoordinator::new(gateway.clone(), history.clone()));
        let flow = CheckoutFlow::new(
            Arc::new(StubBackend::failing()),
            Arc::new(StubBuilder),
            coordinator,
        );

        let err = flow.checkout(&cart, customer()).await.unwrap_err();
        assert!(matches!(err, EngineError::OrderCreationFailed(_)));

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(history.is_empty());
        assert!(!cart.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_customer_rejected_before_backend() {
        let cart = cart_with_line();
        let flow = flow_with(StubBackend::ok(), StubGateway::new("ok"));

        let err = flow
            .checkout(&cart, Customer::new("", "asha@example.com", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
        assert!(!cart.lock().await.is_empty());
    }
}
