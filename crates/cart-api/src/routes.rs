//! # Routes
//!
//! Axum router configuration for the cart and checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - GET  /api/v1/cart - Current cart snapshot
/// - POST /api/v1/cart/items - Add an item (merges by id)
/// - DELETE /api/v1/cart/items/{item_id}?quantity=n - Remove units
/// - POST /api/v1/cart/clear - Empty the cart
/// - POST /api/v1/checkout - Run a checkout
/// - GET  /api/v1/history - Payment history (diagnostics)
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - the mobile clients call from app webviews
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/cart", get(handlers::get_cart))
        .route("/cart/items", post(handlers::add_item))
        .route("/cart/items/{item_id}", delete(handlers::remove_item))
        .route("/cart/clear", post(handlers::clear_cart))
        .route("/checkout", post(handlers::checkout))
        .route("/history", get(handlers::payment_history));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
