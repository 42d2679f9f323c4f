//! # Razorpay Hosted Checkout
//!
//! `PaymentGateway` implementation over the Razorpay REST API. The customer
//! pays through the hosted page; `open_checkout` polls the gateway order for
//! a terminal payment and returns once one appears, classifying provider
//! error codes into the engine taxonomy.

use crate::config::RazorpayConfig;
use async_trait::async_trait;
use cart_core::{
    CheckoutOptions, EngineError, EngineResult, GatewayFailure, GatewayReceipt, PaymentGateway,
};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Razorpay gateway backed by order polling
pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: Client,
}

impl RazorpayGateway {
    /// Create a new gateway client
    pub fn new(config: RazorpayConfig) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                EngineError::InvalidConfiguration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> EngineResult<Self> {
        Self::new(RazorpayConfig::from_env()?)
    }

    async fn fetch_order_payments(&self, order_id: &str) -> EngineResult<PaymentCollection> {
        let url = format!(
            "{}/v1/orders/{}/payments",
            self.config.api_base_url, order_id
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout
                } else {
                    EngineError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("gateway API error: status={}, body={}", status, body);

            if let Ok(envelope) = serde_json::from_str::<GatewayErrorResponse>(&body) {
                return Err(
                    GatewayFailure::new(envelope.error.code, envelope.error.description).classify(),
                );
            }
            return Err(EngineError::NetworkError(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| EngineError::Unknown(format!("failed to parse gateway response: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self, options), fields(gateway_order_id = %options.gateway_order_id))]
    async fn open_checkout(&self, options: &CheckoutOptions) -> EngineResult<GatewayReceipt> {
        options.validate()?;

        debug!(
            amount = options.amount_minor,
            currency = %options.currency,
            "polling gateway order for a terminal payment"
        );

        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(self.config.poll_budget_ms);

        loop {
            let payments = self.fetch_order_payments(&options.gateway_order_id).await?;

            if let Some(paid) = payments
                .items
                .iter()
                .find(|p| p.status == "captured" || p.status == "authorized")
            {
                info!(payment_id = %paid.id, status = %paid.status, "payment completed");
                return Ok(GatewayReceipt {
                    payment_id: paid.id.clone(),
                    order_id: Some(options.gateway_order_id.clone()),
                    signature: None,
                });
            }

            if let Some(failed) = payments.items.iter().find(|p| p.status == "failed") {
                let code = failed
                    .error_code
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                let description = failed.error_description.clone().unwrap_or_default();
                warn!(payment_id = %failed.id, code = %code, "payment failed");
                return Err(GatewayFailure::new(code, description).classify());
            }

            if tokio::time::Instant::now() >= deadline {
                warn!("no terminal payment within the polling budget");
                return Err(EngineError::Timeout);
            }
            tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }
    }

    fn gateway_name(&self) -> &'static str {
        "razorpay"
    }
}

// =============================================================================
// Gateway API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct PaymentCollection {
    #[serde(default)]
    items: Vec<PaymentEntity>,
}

#[derive(Debug, Deserialize)]
struct PaymentEntity {
    id: String,
    status: String,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorResponse {
    error: GatewayErrorBody,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    code: String,
    #[serde(default)]
    description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::{Currency, Customer, RetryFlags};
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(order_id: &str) -> CheckoutOptions {
        CheckoutOptions {
            key_id: "rzp_test_abc".to_string(),
            gateway_order_id: order_id.to_string(),
            amount_minor: 21_000,
            currency: Currency::INR,
            receipt: "rcpt_x".to_string(),
            prefill: Customer::new("Asha Rao", "asha@example.com", "+919800000001"),
            retry: RetryFlags::default(),
            notes: HashMap::new(),
        }
    }

    async fn gateway_for(server: &MockServer) -> RazorpayGateway {
        let config = RazorpayConfig::new("rzp_test_abc", "secret")
            .with_api_base_url(server.uri())
            .with_polling(10, 50);
        RazorpayGateway::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_captured_payment_returns_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/orders/order_1/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "items": [{"id": "pay_77", "status": "captured"}]
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let receipt = gateway.open_checkout(&options("order_1")).await.unwrap();

        assert_eq!(receipt.payment_id, "pay_77");
        assert_eq!(receipt.order_id.as_deref(), Some("order_1"));
    }

    #[tokio::test]
    async fn test_failed_payment_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/orders/order_2/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "items": [{
                    "id": "pay_78",
                    "status": "failed",
                    "error_code": "BAD_REQUEST_ERROR",
                    "error_description": "amount mismatch"
                }]
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let err = gateway.open_checkout(&options("order_2")).await.unwrap_err();
        assert!(matches!(err, EngineError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_cancelled_payment_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/orders/order_3/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "items": [{
                    "id": "pay_79",
                    "status": "failed",
                    "error_code": "payment_cancelled",
                    "error_description": "customer dismissed checkout"
                }]
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let err = gateway.open_checkout(&options("order_3")).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[tokio::test]
    async fn test_error_envelope_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/orders/order_4/payments"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "error": {"code": "GATEWAY_ERROR", "description": "upstream unavailable"}
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let err = gateway.open_checkout(&options("order_4")).await.unwrap_err();
        assert!(matches!(err, EngineError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_no_terminal_payment_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/orders/order_5/payments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "items": [{"id": "pay_80", "status": "created"}]
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let err = gateway.open_checkout(&options("order_5")).await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout));
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_any_call() {
        let server = MockServer::start().await;
        // No mock mounted: any request would 404 into a NetworkError, so an
        // InvalidConfiguration result proves nothing was sent.
        let gateway = gateway_for(&server).await;

        let mut bad = options("order_6");
        bad.gateway_order_id = "".to_string();

        let err = gateway.open_checkout(&bad).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
