//! # Order Backend Client
//!
//! HTTP client for the marketplace backend's order-creation endpoint. The
//! request body comes from the gateway adapter; the protocol is opaque JSON
//! with a success-boolean envelope, and any non-success envelope is a hard
//! `OrderCreationFailed`.

use async_trait::async_trait;
use cart_core::{BackendOrder, CheckoutSession, EngineError, EngineResult, OrderBackend};
use cart_razorpay::RazorpayOptionsBuilder;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, instrument};

/// `OrderBackend` over the marketplace REST API
pub struct HttpOrderBackend {
    client: Client,
    base_url: String,
    builder: RazorpayOptionsBuilder,
}

impl HttpOrderBackend {
    pub fn new(base_url: impl Into<String>, builder: RazorpayOptionsBuilder) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                EngineError::InvalidConfiguration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            builder,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<OrderData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderData {
    id: String,
}

#[async_trait]
impl OrderBackend for HttpOrderBackend {
    #[instrument(skip(self, session), fields(amount = session.amount.minor))]
    async fn create_order(&self, session: &CheckoutSession) -> EngineResult<BackendOrder> {
        let body = self.builder.build_order_request(session)?;
        let url = format!("{}/api/v1/orders", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::OrderCreationFailed(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::OrderCreationFailed(e.to_string()))?;

        if !status.is_success() {
            error!("backend order creation error: status={}, body={}", status, text);
            return Err(EngineError::OrderCreationFailed(format!(
                "HTTP {status}: {text}"
            )));
        }

        let envelope: Envelope = serde_json::from_str(&text).map_err(|e| {
            EngineError::OrderCreationFailed(format!("malformed backend envelope: {e}"))
        })?;

        if !envelope.success {
            return Err(EngineError::OrderCreationFailed(
                envelope
                    .message
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            ));
        }

        let data = envelope.data.ok_or_else(|| {
            EngineError::OrderCreationFailed("success envelope missing order data".to_string())
        })?;

        Ok(BackendOrder { id: data.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::{Currency, Customer, Money};
    use cart_razorpay::RazorpayConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> CheckoutSession {
        CheckoutSession::new(
            Money::from_minor(21_000, Currency::INR),
            Customer::new("Asha Rao", "asha@example.com", "+919800000001"),
        )
    }

    fn backend_for(server: &MockServer) -> HttpOrderBackend {
        let builder = RazorpayOptionsBuilder::new(RazorpayConfig::new("rzp_test_abc", "secret"));
        HttpOrderBackend::new(server.uri(), builder).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/orders"))
            .and(body_partial_json(json!({"amount": 21_000, "currency": "INR"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": "order_55"}
            })))
            .mount(&server)
            .await;

        let order = backend_for(&server).create_order(&session()).await.unwrap();
        assert_eq!(order.id, "order_55");
    }

    #[tokio::test]
    async fn test_failure_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "seller is offline"
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .create_order(&session())
            .await
            .unwrap_err();
        match err {
            EngineError::OrderCreationFailed(message) => {
                assert_eq!(message, "seller is offline")
            }
            other => panic!("expected OrderCreationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/orders"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .create_order(&session())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::OrderCreationFailed(_)));
    }

    #[tokio::test]
    async fn test_invalid_session_fails_before_any_call() {
        let server = MockServer::start().await;
        let backend = backend_for(&server);

        let mut zero = session();
        zero.amount = Money::zero(Currency::INR);

        let err = backend.create_order(&zero).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
