//! # Gateway & Backend Seams
//!
//! Trait boundaries between the engine and its external collaborators: the
//! payment gateway, the order-creation backend, and the provider-specific
//! options builder. Implementations live in provider crates; the
//! orchestrator and flow only see these traits.

use crate::error::EngineResult;
use crate::session::{CheckoutOptions, CheckoutSession, GatewayReceipt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A hosted payment gateway.
///
/// `open_checkout` suspends until the customer completes, cancels, or the
/// gateway errors. Implementations return pre-classified `EngineError`s —
/// the orchestrator never sees raw provider codes.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn open_checkout(&self, options: &CheckoutOptions) -> EngineResult<GatewayReceipt>;

    /// Provider name, for logging and history
    fn gateway_name(&self) -> &'static str;
}

/// Type alias for a boxed payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Order record issued by the backend before checkout. The backend creates
/// the order with the gateway server-side, so `id` is the gateway order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendOrder {
    pub id: String,
}

/// The marketplace backend's order-creation endpoint.
///
/// Any non-success envelope must surface as `OrderCreationFailed`; the flow
/// aborts before any gateway interaction in that case.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn create_order(&self, session: &CheckoutSession) -> EngineResult<BackendOrder>;
}

/// Type alias for a boxed order backend
pub type BoxedOrderBackend = Arc<dyn OrderBackend>;

/// Provider-specific translation from a checkout session to gateway options.
/// Pure; must validate amount and customer fields before anything touches
/// the network.
pub trait CheckoutOptionsBuilder: Send + Sync {
    fn build(
        &self,
        session: &CheckoutSession,
        gateway_order_id: &str,
    ) -> EngineResult<CheckoutOptions>;
}

/// Type alias for a boxed options builder
pub type BoxedOptionsBuilder = Arc<dyn CheckoutOptionsBuilder>;
