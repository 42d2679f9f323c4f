//! # SwiftCart RS
//!
//! Cart and payment transaction engine for the marketplace clients.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export RAZORPAY_KEY_ID=rzp_test_...
//! export RAZORPAY_KEY_SECRET=...
//! export BACKEND_API_URL=https://api.example.com
//!
//! # Run the server
//! swiftcart
//! ```

use cart_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Cart currency: {}", state.settings.currency);
    info!(
        "Retry policy: {} retries, {}ms backoff",
        state.settings.max_retries, state.settings.backoff_ms
    );
    info!("Payment history: {}", state.config.history_path);

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("SwiftCart starting on http://{}", addr);

    if !is_prod {
        info!("Cart:     GET  http://{}/api/v1/cart", addr);
        info!("Checkout: POST http://{}/api/v1/checkout", addr);
        info!("History:  GET  http://{}/api/v1/history", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
