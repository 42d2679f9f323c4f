//! # Engine Error Types
//!
//! Typed error handling for the swiftcart transaction engine.
//! All cart and payment operations return `Result<T, EngineError>`.

use thiserror::Error;

/// Core error type for all cart and payment operations.
///
/// The variants fall into three bands: cart-side errors (locally recoverable,
/// state left unchanged), checkout precondition failures (terminal for the
/// current attempt), and gateway-classified failures (everything except
/// `Cancelled` is eligible for automatic retry).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Cart already holds lines from a different seller
    #[error("cart holds items from seller {in_cart}, cannot add items from {offered}")]
    CrossSellerConflict { in_cart: String, offered: String },

    /// Line not present in the cart
    #[error("item not found in cart: {item_id}")]
    ItemNotFound { item_id: String },

    /// Adding would push a line past the configured quantity ceiling
    #[error("quantity limit {limit} exceeded for item {item_id}")]
    QuantityLimitExceeded { item_id: String, limit: u32 },

    /// Negative or overflowing monetary value
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Missing or malformed checkout configuration (key, order id, amount)
    #[error("invalid payment configuration: {0}")]
    InvalidConfiguration(String),

    /// A payment attempt is already in flight
    #[error("a payment is already in progress")]
    PaymentAlreadyInProgress,

    /// Backend order creation returned a non-success envelope
    #[error("order creation failed: {0}")]
    OrderCreationFailed(String),

    /// Checkout requested on an empty cart
    #[error("cart is empty")]
    EmptyCart,

    /// Customer dismissed the gateway checkout
    #[error("payment cancelled by customer")]
    Cancelled,

    /// Network failure talking to the gateway
    #[error("gateway network error: {0}")]
    NetworkError(String),

    /// Gateway rejected the request as malformed
    #[error("gateway rejected request: {0}")]
    BadRequest(String),

    /// Gateway did not reach a terminal payment state in time
    #[error("gateway timed out")]
    Timeout,

    /// Unclassified gateway failure
    #[error("gateway error: {0}")]
    Unknown(String),

    /// Internal error (should not happen)
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns true if the orchestrator may automatically retry after this
    /// error. Cancellation is terminal; so is everything outside the
    /// gateway-classified band.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::NetworkError(_)
                | EngineError::BadRequest(_)
                | EngineError::Timeout
                | EngineError::Unknown(_)
        )
    }

    /// Returns true for errors reported by (or classified from) the gateway.
    pub fn is_gateway_error(&self) -> bool {
        matches!(
            self,
            EngineError::Cancelled
                | EngineError::NetworkError(_)
                | EngineError::BadRequest(_)
                | EngineError::Timeout
                | EngineError::Unknown(_)
        )
    }

    /// Stable machine-readable code, recorded in payment history entries.
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::CrossSellerConflict { .. } => "cross_seller_conflict",
            EngineError::ItemNotFound { .. } => "item_not_found",
            EngineError::QuantityLimitExceeded { .. } => "quantity_limit_exceeded",
            EngineError::InvalidAmount(_) => "invalid_amount",
            EngineError::InvalidConfiguration(_) => "invalid_configuration",
            EngineError::PaymentAlreadyInProgress => "payment_in_progress",
            EngineError::OrderCreationFailed(_) => "order_creation_failed",
            EngineError::EmptyCart => "empty_cart",
            EngineError::Cancelled => "cancelled",
            EngineError::NetworkError(_) => "network_error",
            EngineError::BadRequest(_) => "bad_request",
            EngineError::Timeout => "timeout",
            EngineError::Unknown(_) => "unknown",
            EngineError::Internal(_) => "internal",
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::CrossSellerConflict { .. } => 409,
            EngineError::ItemNotFound { .. } => 404,
            EngineError::QuantityLimitExceeded { .. } => 409,
            EngineError::InvalidAmount(_) => 400,
            EngineError::InvalidConfiguration(_) => 500,
            EngineError::PaymentAlreadyInProgress => 409,
            EngineError::OrderCreationFailed(_) => 502,
            EngineError::EmptyCart => 400,
            EngineError::Cancelled => 402,
            EngineError::NetworkError(_) => 503,
            EngineError::BadRequest(_) => 502,
            EngineError::Timeout => 504,
            EngineError::Unknown(_) => 502,
            EngineError::Internal(_) => 500,
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Raw failure reported by the payment gateway.
///
/// The gateway surfaces `{code, description}` pairs; `classify` maps them
/// into the engine's fixed error kinds. Unrecognized codes land in `Unknown`
/// so nothing is swallowed.
#[derive(Debug, Clone)]
pub struct GatewayFailure {
    pub code: String,
    pub description: String,
}

impl GatewayFailure {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }

    /// Map a gateway-reported code into the engine taxonomy.
    pub fn classify(self) -> EngineError {
        let code = self.code.to_ascii_lowercase();

        if code.contains("cancel") {
            EngineError::Cancelled
        } else if code.contains("timeout") || code.contains("timed_out") {
            EngineError::Timeout
        } else if code.contains("network")
            || code.contains("connection")
            || code.contains("gateway_error")
            || code.contains("server_error")
        {
            EngineError::NetworkError(self.description)
        } else if code.contains("bad_request") {
            EngineError::BadRequest(self.description)
        } else if self.description.is_empty() {
            EngineError::Unknown(self.code)
        } else {
            EngineError::Unknown(format!("{}: {}", self.code, self.description))
        }
    }
}
