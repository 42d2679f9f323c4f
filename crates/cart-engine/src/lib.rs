//! # cart-engine
//!
//! Payment orchestration for swiftcart-rs.
//!
//! This crate provides:
//! - `PaymentCoordinator` — serialized gateway attempts with mutual
//!   exclusion, bounded retries, and an audit record per attempt
//! - `CheckoutFlow` — the controller tying backend order creation, option
//!   building, and the coordinated payment to the cart lifecycle
//! - `JsonlHistoryStore` — append-only on-disk payment history
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_engine::{CheckoutFlow, PaymentCoordinator, RetryPolicy};
//!
//! let coordinator = Arc::new(PaymentCoordinator::new(gateway, history));
//! let flow = CheckoutFlow::new(backend, builder, coordinator);
//!
//! match flow.checkout(&cart, customer).await {
//!     Ok(outcome) => println!("paid: {}", outcome.payment_id),
//!     Err(err) => eprintln!("checkout failed: {err}"),
//! }
//! ```

pub mod coordinator;
pub mod flow;
pub mod history_file;

// Re-exports
pub use coordinator::{PaymentCoordinator, RetryPolicy};
pub use flow::{CheckoutFlow, CheckoutOutcome, SharedCart};
pub use history_file::JsonlHistoryStore;
