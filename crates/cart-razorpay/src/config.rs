//! # Razorpay Configuration
//!
//! Configuration management for the Razorpay integration.
//! All secrets are loaded from environment variables.

use cart_core::{EngineError, EngineResult};
use std::env;

/// Razorpay API configuration
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// API key id (rzp_test_... or rzp_live_...)
    pub key_id: String,

    /// API key secret
    pub key_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// How often the gateway polls the order for a terminal payment
    pub poll_interval_ms: u64,

    /// Overall polling budget before the checkout classifies as a timeout
    pub poll_budget_ms: u64,
}

impl RazorpayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `RAZORPAY_KEY_ID`
    /// - `RAZORPAY_KEY_SECRET`
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let key_id = env::var("RAZORPAY_KEY_ID").map_err(|_| {
            EngineError::InvalidConfiguration("RAZORPAY_KEY_ID not set".to_string())
        })?;

        let key_secret = env::var("RAZORPAY_KEY_SECRET").map_err(|_| {
            EngineError::InvalidConfiguration("RAZORPAY_KEY_SECRET not set".to_string())
        })?;

        Self::new(key_id, key_secret).validated()
    }

    /// Create config with explicit values (for testing)
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            api_base_url: "https://api.razorpay.com".to_string(),
            poll_interval_ms: 2_000,
            poll_budget_ms: 300_000,
        }
    }

    fn validated(self) -> EngineResult<Self> {
        if !self.key_id.starts_with("rzp_test_") && !self.key_id.starts_with("rzp_live_") {
            return Err(EngineError::InvalidConfiguration(
                "RAZORPAY_KEY_ID must start with rzp_test_ or rzp_live_".to_string(),
            ));
        }
        if self.key_secret.trim().is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "RAZORPAY_KEY_SECRET must not be blank".to_string(),
            ));
        }
        Ok(self)
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.key_id.starts_with("rzp_live_")
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: tune the polling cadence
    pub fn with_polling(mut self, interval_ms: u64, budget_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self.poll_budget_ms = budget_ms;
        self
    }
}
