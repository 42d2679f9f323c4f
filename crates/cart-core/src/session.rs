//! # Checkout Value Objects
//!
//! Transient values built fresh per checkout: the session, the customer
//! prefill, the gateway checkout options, and the receipt the gateway hands
//! back on success. Owned by the checkout flow for one attempt sequence and
//! discarded after a terminal outcome.

use crate::cart::CartSnapshot;
use crate::error::{EngineError, EngineResult};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Customer details prefillable into the gateway checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Customer {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// All fields are required for checkout; validated before any network
    /// call is made.
    pub fn validate(&self) -> EngineResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(EngineError::InvalidConfiguration(format!(
                    "customer {field} is blank"
                )));
            }
        }
        Ok(())
    }
}

/// One checkout in flight: the amount to collect and who is paying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Grand total to collect
    pub amount: Money,

    /// Paying customer
    pub customer: Customer,

    /// Merchant-side order reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_order_id: Option<String>,
}

impl CheckoutSession {
    pub fn new(amount: Money, customer: Customer) -> Self {
        Self {
            amount,
            customer,
            merchant_order_id: Some(Uuid::new_v4().to_string()),
        }
    }

    /// Build a session from a cart snapshot's grand total
    pub fn from_snapshot(snapshot: &CartSnapshot, customer: Customer) -> Self {
        Self::new(snapshot.grand_total(), customer)
    }

    pub fn with_merchant_order_id(mut self, id: impl Into<String>) -> Self {
        self.merchant_order_id = Some(id.into());
        self
    }
}

/// Gateway-side retry knobs passed through in the checkout options.
///
/// Disabled by default: the orchestrator owns retries, the gateway modal
/// must not run its own on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryFlags {
    pub enabled: bool,
    pub max_count: u32,
}

impl Default for RetryFlags {
    fn default() -> Self {
        Self {
            enabled: false,
            max_count: 0,
        }
    }
}

/// Fully-built options for one gateway checkout invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutOptions {
    /// Gateway API key id
    pub key_id: String,

    /// Backend-issued gateway order id
    pub gateway_order_id: String,

    /// Amount in currency minor units
    pub amount_minor: i64,

    /// Currency
    pub currency: Currency,

    /// Deterministic receipt/idempotency token
    pub receipt: String,

    /// Customer prefill
    pub prefill: Customer,

    /// Gateway-side retry flags
    #[serde(default)]
    pub retry: RetryFlags,

    /// Free-form notes passed through to the gateway
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub notes: HashMap<String, String>,
}

impl CheckoutOptions {
    /// Key and order id presence, positive amount. The orchestrator calls
    /// this before touching the gateway; failure is terminal with no retry.
    pub fn validate(&self) -> EngineResult<()> {
        if self.key_id.trim().is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "gateway key id is missing".to_string(),
            ));
        }
        if self.gateway_order_id.trim().is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "gateway order id is missing".to_string(),
            ));
        }
        if self.amount_minor <= 0 {
            return Err(EngineError::InvalidConfiguration(format!(
                "checkout amount must be positive, got {}",
                self.amount_minor
            )));
        }
        Ok(())
    }
}

/// What the gateway returns when the customer completes payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayReceipt {
    /// Gateway payment identifier
    pub payment_id: String,

    /// Gateway order id echoed back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Gateway signature over (order id, payment id), when provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}
