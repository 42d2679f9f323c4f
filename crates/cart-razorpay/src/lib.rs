//! # cart-razorpay
//!
//! Razorpay gateway adapter for swiftcart-rs.
//!
//! This crate is the translation layer between domain values and the
//! gateway:
//!
//! - **RazorpayOptionsBuilder** — builds the backend order-creation body and
//!   the hosted-checkout options from a `CheckoutSession`, validating amount
//!   and customer fields before anything touches the network.
//! - **RazorpayGateway** — `PaymentGateway` implementation that polls the
//!   gateway order until a terminal payment appears and classifies provider
//!   error codes into the engine taxonomy.
//! - **signature** — HMAC-SHA256 verification of the payment signature the
//!   gateway returns on success.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_razorpay::{RazorpayConfig, RazorpayGateway, RazorpayOptionsBuilder};
//! use cart_core::CheckoutOptionsBuilder;
//!
//! let config = RazorpayConfig::from_env()?;
//! let builder = RazorpayOptionsBuilder::new(config.clone());
//! let gateway = RazorpayGateway::new(config)?;
//!
//! let options = builder.build(&session, &backend_order.id)?;
//! let receipt = gateway.open_checkout(&options).await?;
//! ```

pub mod adapter;
pub mod config;
pub mod gateway;
pub mod signature;

// Re-exports
pub use adapter::{receipt_token, OrderCreateRequest, RazorpayOptionsBuilder};
pub use config::RazorpayConfig;
pub use gateway::RazorpayGateway;
pub use signature::{payment_signature, verify_payment_signature};
