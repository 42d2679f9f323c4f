//! # cart-api
//!
//! HTTP API layer for swiftcart-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for cart mutation and checkout
//! - The `OrderBackend` client for the marketplace backend
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/cart` | Cart snapshot |
//! | POST | `/api/v1/cart/items` | Add item |
//! | DELETE | `/api/v1/cart/items/:id` | Remove item units |
//! | POST | `/api/v1/cart/clear` | Empty the cart |
//! | POST | `/api/v1/checkout` | Run a checkout |
//! | GET | `/api/v1/history` | Payment history |

pub mod backend;
pub mod handlers;
pub mod routes;
pub mod state;

pub use backend::HttpOrderBackend;
pub use routes::create_router;
pub use state::{AppConfig, AppState, EngineSettings};
