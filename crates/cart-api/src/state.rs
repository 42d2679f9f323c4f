//! # Application State
//!
//! Shared state for the axum application: the shared cart, the checkout
//! flow with its injected coordinator, and configuration.

use crate::backend::HttpOrderBackend;
use cart_core::{BoxedHistoryStore, Cart, Currency};
use cart_engine::{CheckoutFlow, JsonlHistoryStore, PaymentCoordinator, RetryPolicy, SharedCart};
use cart_razorpay::{RazorpayConfig, RazorpayGateway, RazorpayOptionsBuilder};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Base URL of the marketplace backend
    pub backend_api_url: String,
    /// Path of the append-only payment history file
    pub history_path: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            backend_api_url: std::env::var("BACKEND_API_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            history_path: std::env::var("HISTORY_PATH")
                .unwrap_or_else(|_| "data/payment_history.jsonl".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Engine tuning loaded from `config/engine.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Automatic retries after the first gateway attempt
    pub max_retries: u32,
    /// Fixed backoff between attempts, milliseconds
    pub backoff_ms: u64,
    /// Optional per-line quantity ceiling for the cart
    pub quantity_limit: Option<u32>,
    /// Cart currency
    pub currency: Currency,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 1_000,
            quantity_limit: None,
            currency: Currency::INR,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The shared cart
    pub cart: SharedCart,
    /// Checkout flow controller
    pub flow: Arc<CheckoutFlow>,
    /// Payment history (diagnostics reads)
    pub history: BoxedHistoryStore,
    /// Gateway configuration (signature verification)
    pub gateway_config: RazorpayConfig,
    /// Application config
    pub config: AppConfig,
    /// Engine tuning
    pub settings: EngineSettings,
}

impl AppState {
    /// Wire the full engine from environment and config files
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let settings = load_engine_settings();

        let gateway_config = RazorpayConfig::from_env()?;
        let gateway = Arc::new(RazorpayGateway::new(gateway_config.clone())?);

        let history: BoxedHistoryStore = Arc::new(JsonlHistoryStore::new(&config.history_path)?);

        let coordinator = Arc::new(
            PaymentCoordinator::new(gateway, history.clone()).with_policy(RetryPolicy {
                max_retries: settings.max_retries,
                backoff: Duration::from_millis(settings.backoff_ms),
            }),
        );

        let backend = Arc::new(HttpOrderBackend::new(
            &config.backend_api_url,
            RazorpayOptionsBuilder::new(gateway_config.clone()),
        )?);
        let builder = Arc::new(RazorpayOptionsBuilder::new(gateway_config.clone()));
        let flow = Arc::new(CheckoutFlow::new(backend, builder, coordinator));

        let mut cart = Cart::new(settings.currency);
        if let Some(limit) = settings.quantity_limit {
            cart = cart.with_quantity_limit(limit);
        }

        Ok(Self {
            cart: Arc::new(Mutex::new(cart)),
            flow,
            history,
            gateway_config,
            config,
            settings,
        })
    }
}

/// Load engine settings from `config/engine.toml`, falling back to defaults
/// when no config file is found.
fn load_engine_settings() -> EngineSettings {
    let config_paths = [
        "config/engine.toml",
        "../config/engine.toml",
        "../../config/engine.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            match toml::from_str::<EngineSettings>(&content) {
                Ok(settings) => {
                    tracing::info!("Loaded engine settings from {}", path);
                    return settings;
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed {}: {}", path, e);
                }
            }
        }
    }

    tracing::warn!("No engine config found, using defaults");
    EngineSettings::default()
}
