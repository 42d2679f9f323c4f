//! # Request Handlers
//!
//! Axum request handlers for the cart and checkout API. Every failure maps
//! to a tagged `ErrorResponse`; the engine never leaks a panic across this
//! boundary. Presentation (toasts, alerts) is the client's job — handlers
//! only return tagged results.

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use cart_core::{CartLine, CartSnapshot, Customer, EngineError, Money, TaxRate};
use cart_engine::CheckoutOutcome;
use cart_razorpay::verify_payment_signature;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Add-item request
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Item id
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit price as a decimal amount in the cart currency
    pub unit_price: f64,
    /// Quantity to add
    pub quantity: u32,
    /// Seller owning the item
    pub seller_id: String,
    /// Flat tax rate percentage for the item
    #[serde(default)]
    pub tax_rate_percent: f64,
}

/// Remove-item query parameters
#[derive(Debug, Deserialize)]
pub struct RemoveParams {
    /// How many units to remove
    #[serde(default = "default_remove_quantity")]
    pub quantity: u32,
}

fn default_remove_quantity() -> u32 {
    1
}

/// Checkout request
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    /// Machine-readable tag the client switches on for messaging
    pub tag: &'static str,
}

impl ErrorResponse {
    fn from_engine(err: &EngineError) -> Self {
        Self {
            error: err.to_string(),
            code: err.status_code(),
            tag: err.error_code(),
        }
    }
}

fn engine_error_to_response(err: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let response = ErrorResponse::from_engine(&err);
    let status =
        StatusCode::from_u16(response.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "swiftcart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Current cart snapshot
pub async fn get_cart(State(state): State<AppState>) -> Json<CartSnapshot> {
    Json(state.cart.lock().await.snapshot())
}

/// Add an item to the cart (merges by id)
#[instrument(skip(state, request), fields(item_id = %request.id, seller_id = %request.seller_id))]
pub async fn add_item(
    State(state): State<AppState>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let tax_rate =
        TaxRate::from_percent(request.tax_rate_percent).map_err(engine_error_to_response)?;

    let mut cart = state.cart.lock().await;
    let line = CartLine::new(
        request.id,
        request.name,
        Money::new(request.unit_price, cart.currency()),
        request.quantity,
        request.seller_id,
        tax_rate,
    );

    cart.add_line(line).map_err(engine_error_to_response)?;
    Ok(Json(cart.snapshot()))
}

/// Remove units of an item from the cart
#[instrument(skip(state), fields(item_id = %item_id, quantity = params.quantity))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<CartSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let mut cart = state.cart.lock().await;
    cart.remove_line(&item_id, params.quantity)
        .map_err(engine_error_to_response)?;
    Ok(Json(cart.snapshot()))
}

/// Empty the cart
pub async fn clear_cart(State(state): State<AppState>) -> Json<CartSnapshot> {
    let mut cart = state.cart.lock().await;
    cart.clear();
    Json(cart.snapshot())
}

/// Run a checkout for the cart's current contents
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutOutcome>, (StatusCode, Json<ErrorResponse>)> {
    let customer = Customer::new(request.name, request.email, request.phone);

    let outcome = state
        .flow
        .checkout(&state.cart, customer)
        .await
        .map_err(|e| {
            warn!("checkout failed: {}", e);
            engine_error_to_response(e)
        })?;

    // The gateway signs successful payments; reject a bad signature before
    // reporting success to the client.
    if let Some(ref signature) = outcome.signature {
        let valid = verify_payment_signature(
            &state.gateway_config.key_secret,
            &outcome.order_id,
            &outcome.payment_id,
            signature,
        );
        if !valid {
            error!(payment_id = %outcome.payment_id, "payment signature mismatch");
            return Err(engine_error_to_response(EngineError::Unknown(
                "payment signature mismatch".to_string(),
            )));
        }
    }

    info!(payment_id = %outcome.payment_id, order_id = %outcome.order_id, "checkout succeeded");
    Ok(Json(outcome))
}

/// Payment history (diagnostics)
pub async fn payment_history(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let records = state.history.records().map_err(engine_error_to_response)?;
    Ok(Json(serde_json::json!({
        "count": records.len(),
        "records": records,
    })))
}
