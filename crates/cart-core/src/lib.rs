//! # cart-core
//!
//! Core types and traits for the swiftcart transaction engine.
//!
//! This crate provides:
//! - `Cart`, `CartLine`, and `CartSnapshot` for the single-seller cart
//! - `Money`, `TaxRate`, and the pure tax calculator functions
//! - `CheckoutSession`, `CheckoutOptions`, and `GatewayReceipt` for checkout
//! - `PaymentGateway`, `OrderBackend`, and `CheckoutOptionsBuilder` seams
//! - `PaymentAttempt` and `HistoryStore` for the append-only audit trail
//! - `EngineError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{Cart, CartLine, Currency, Money, TaxRate};
//!
//! let mut cart = Cart::new(Currency::INR);
//! cart.add_line(CartLine::new(
//!     "dosa-99",
//!     "Masala Dosa",
//!     Money::new(100.0, Currency::INR),
//!     2,
//!     "seller-7",
//!     TaxRate::from_percent(5.0)?,
//! ))?;
//!
//! let snapshot = cart.snapshot();
//! assert_eq!(snapshot.totals.grand_total, 21_000);
//! ```

pub mod cart;
pub mod error;
pub mod gateway;
pub mod history;
pub mod money;
pub mod session;

// Re-exports for convenience
pub use cart::{Cart, CartLine, CartSnapshot, CartTotals};
pub use error::{EngineError, EngineResult, GatewayFailure};
pub use gateway::{
    BackendOrder, BoxedOptionsBuilder, BoxedOrderBackend, BoxedPaymentGateway,
    CheckoutOptionsBuilder, OrderBackend, PaymentGateway,
};
pub use history::{
    AttemptStatus, BoxedHistoryStore, HistoryStore, MemoryHistoryStore, PaymentAttempt,
};
pub use money::{cart_totals, line_tax, line_total, Currency, Money, TaxRate};
pub use session::{CheckoutOptions, CheckoutSession, Customer, GatewayReceipt, RetryFlags};
