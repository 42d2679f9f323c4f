//! # Checkout Option Builders
//!
//! Pure translation layer from domain values to Razorpay request shapes:
//! the backend order-creation body and the hosted-checkout options. All
//! validation happens here, before any network call.

use crate::config::RazorpayConfig;
use cart_core::{
    CheckoutOptions, CheckoutOptionsBuilder, CheckoutSession, EngineError, EngineResult,
    RetryFlags,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Body of the backend order-creation request
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreateRequest {
    /// Amount in currency minor units
    pub amount: i64,
    /// ISO currency code, uppercase
    pub currency: String,
    /// Deterministic receipt token
    pub receipt: String,
}

/// Builds gateway requests and checkout options from a `CheckoutSession`.
pub struct RazorpayOptionsBuilder {
    config: RazorpayConfig,
}

impl RazorpayOptionsBuilder {
    pub fn new(config: RazorpayConfig) -> Self {
        Self { config }
    }

    /// Build the order-creation body sent to the backend.
    pub fn build_order_request(&self, session: &CheckoutSession) -> EngineResult<OrderCreateRequest> {
        validate_session(session)?;
        Ok(OrderCreateRequest {
            amount: session.amount.minor,
            currency: session.amount.currency.to_string(),
            receipt: receipt_token(session),
        })
    }
}

impl CheckoutOptionsBuilder for RazorpayOptionsBuilder {
    fn build(
        &self,
        session: &CheckoutSession,
        gateway_order_id: &str,
    ) -> EngineResult<CheckoutOptions> {
        validate_session(session)?;

        let mut notes = HashMap::new();
        if let Some(ref merchant_order_id) = session.merchant_order_id {
            notes.insert("merchant_order_id".to_string(), merchant_order_id.clone());
        }

        Ok(CheckoutOptions {
            key_id: self.config.key_id.clone(),
            gateway_order_id: gateway_order_id.to_string(),
            amount_minor: session.amount.minor,
            currency: session.amount.currency,
            receipt: receipt_token(session),
            prefill: session.customer.clone(),
            retry: RetryFlags::default(),
            notes,
        })
    }
}

fn validate_session(session: &CheckoutSession) -> EngineResult<()> {
    if !session.amount.is_positive() {
        return Err(EngineError::InvalidConfiguration(format!(
            "checkout amount must be positive, got {}",
            session.amount.minor
        )));
    }
    session.customer.validate()
}

/// Deterministic receipt/idempotency token for a session.
///
/// Same session inputs always yield the same token, so a retried checkout
/// cannot double-charge through the order-creation path.
pub fn receipt_token(session: &CheckoutSession) -> String {
    let seed = format!(
        "{}:{}:{}:{}",
        session.merchant_order_id.as_deref().unwrap_or(""),
        session.amount.minor,
        session.amount.currency,
        session.customer.email,
    );
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("rcpt_{}", &digest[..20])
}
