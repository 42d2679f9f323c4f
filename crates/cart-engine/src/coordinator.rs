//! # Payment Coordinator
//!
//! Serializes payment attempts against the gateway. Exactly one attempt may
//! be in flight process-wide; a second caller fails fast with
//! `PaymentAlreadyInProgress` before the gateway is ever contacted, which is
//! what keeps a double-tap from double-charging.
//!
//! The coordinator is an owned object injected into its callers — there is
//! no global instance. The in-flight flag is private state, acquired with a
//! compare-exchange and released by a drop guard on every exit path.

use cart_core::{
    BoxedHistoryStore, BoxedPaymentGateway, CheckoutOptions, EngineError, EngineResult,
    GatewayReceipt, PaymentAttempt,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Automatic retry knobs for transient gateway failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; total attempts = max_retries + 1
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(1_000),
        }
    }
}

/// Orchestrates gateway checkouts: mutual exclusion, bounded retries, and
/// an audit record per attempt.
pub struct PaymentCoordinator {
    gateway: BoxedPaymentGateway,
    history: BoxedHistoryStore,
    policy: RetryPolicy,
    in_flight: AtomicBool,
}

impl PaymentCoordinator {
    pub fn new(gateway: BoxedPaymentGateway, history: BoxedHistoryStore) -> Self {
        Self {
            gateway,
            history,
            policy: RetryPolicy::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Builder: override the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run one checkout through the gateway.
    ///
    /// Holds exclusivity across the whole retry sequence. Cancellation is
    /// terminal and never retried; every gateway invocation is recorded in
    /// history regardless of outcome. An invalid-configuration short-circuit
    /// happens before the first invocation, so it leaves no attempt record.
    #[instrument(skip(self, options), fields(gateway = self.gateway.gateway_name(), gateway_order_id = %options.gateway_order_id))]
    pub async fn process_payment(&self, options: &CheckoutOptions) -> EngineResult<GatewayReceipt> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("rejecting concurrent payment attempt");
            return Err(EngineError::PaymentAlreadyInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        options.validate()?;

        let mut attempt: u32 = 0;
        loop {
            let outcome = self
                .gateway
                .open_checkout(options)
                .await
                .and_then(|receipt| {
                    if receipt.payment_id.is_empty() {
                        Err(EngineError::Unknown(
                            "gateway returned an empty payment id".to_string(),
                        ))
                    } else {
                        Ok(receipt)
                    }
                });

            match outcome {
                Ok(receipt) => {
                    info!(payment_id = %receipt.payment_id, attempt, "payment succeeded");
                    self.record(PaymentAttempt::succeeded(
                        options.gateway_order_id.as_str(),
                        receipt.payment_id.as_str(),
                        attempt,
                    ));
                    return Ok(receipt);
                }
                Err(err) if matches!(err, EngineError::Cancelled) => {
                    info!(attempt, "payment cancelled by customer");
                    self.record(PaymentAttempt::cancelled(
                        options.gateway_order_id.as_str(),
                        attempt,
                    ));
                    return Err(err);
                }
                Err(err) => {
                    self.record(PaymentAttempt::failed(
                        options.gateway_order_id.as_str(),
                        err.error_code(),
                        attempt,
                    ));
                    if !err.is_retryable() || attempt >= self.policy.max_retries {
                        error!(code = err.error_code(), attempt, "payment failed, surfacing to caller");
                        return Err(err);
                    }
                    warn!(
                        code = err.error_code(),
                        attempt,
                        max_retries = self.policy.max_retries,
                        "payment attempt failed, backing off before retry"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.policy.backoff).await;
                }
            }
        }
    }

    fn record(&self, attempt: PaymentAttempt) {
        if let Err(err) = self.history.append(attempt) {
            // The payment outcome is authoritative; a failed audit write must
            // not change it.
            error!(error = %err, "failed to append payment history record");
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cart_core::{
        AttemptStatus, Currency, Customer, HistoryStore, MemoryHistoryStore, PaymentGateway,
        RetryFlags,
    };
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::AtomicU32;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    fn options() -> CheckoutOptions {
        CheckoutOptions {
            key_id: "rzp_test_abc".to_string(),
            gateway_order_id: "order_1".to_string(),
            amount_minor: 21_000,
            currency: Currency::INR,
            receipt: "rcpt_x".to_string(),
            prefill: Customer::new("Asha Rao", "asha@example.com", "+919800000001"),
            retry: RetryFlags::default(),
            notes: HashMap::new(),
        }
    }

    fn receipt(payment_id: &str) -> GatewayReceipt {
        GatewayReceipt {
            payment_id: payment_id.to_string(),
            order_id: Some("order_1".to_string()),
            signature: None,
        }
    }

    /// Pops one scripted outcome per call; blocks on the gate first when one
    /// is installed.
    struct ScriptedGateway {
        outcomes: Mutex<VecDeque<EngineResult<GatewayReceipt>>>,
        calls: AtomicU32,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedGateway {
        fn new(outcomes: Vec<EngineResult<GatewayReceipt>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
                gate: None,
            }
        }

        fn gated(outcomes: Vec<EngineResult<GatewayReceipt>>, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(outcomes)
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentGateway for ScriptedGateway {
        async fn open_checkout(&self, _options: &CheckoutOptions) -> EngineResult<GatewayReceipt> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(EngineError::Unknown("script exhausted".to_string())))
        }

        fn gateway_name(&self) -> &'static str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_success_records_one_attempt() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(receipt("pay_1"))]));
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = PaymentCoordinator::new(gateway.clone(), history.clone());

        let result = coordinator.process_payment(&options()).await.unwrap();
        assert_eq!(result.payment_id, "pay_1");
        assert_eq!(gateway.calls(), 1);
        assert!(!coordinator.is_in_flight());

        let records = history.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttemptStatus::Success);
        assert_eq!(records[0].payment_id.as_deref(), Some("pay_1"));
        assert_eq!(records[0].attempt_number, 0);
    }

    #[tokio::test]
    async fn test_mutual_exclusion() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(ScriptedGateway::gated(
            vec![Ok(receipt("pay_1"))],
            gate.clone(),
        ));
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = Arc::new(PaymentCoordinator::new(gateway, history.clone()));

        let first = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.process_payment(&options()).await }
        });

        // Let the first attempt acquire the flag and reach the gateway
        tokio::task::yield_now().await;
        assert!(coordinator.is_in_flight());

        let second = coordinator.process_payment(&options()).await;
        assert!(matches!(second, Err(EngineError::PaymentAlreadyInProgress)));

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.payment_id, "pay_1");

        // Exactly one terminal outcome in history; the rejected caller never
        // reached the gateway
        assert_eq!(history.len(), 1);
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_on_network_errors() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(EngineError::NetworkError("reset".to_string())),
            Err(EngineError::NetworkError("reset".to_string())),
            Err(EngineError::NetworkError("reset".to_string())),
            Err(EngineError::NetworkError("reset".to_string())),
        ]));
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = PaymentCoordinator::new(gateway.clone(), history.clone());

        let err = coordinator.process_payment(&options()).await.unwrap_err();
        assert!(matches!(err, EngineError::NetworkError(_)));

        // max_retries (3) + the initial attempt
        assert_eq!(gateway.calls(), 4);
        let records = history.records().unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.status == AttemptStatus::Failed));
        assert_eq!(
            records.iter().map(|r| r.attempt_number).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn test_no_retry_after_cancellation() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(EngineError::Cancelled)]));
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = PaymentCoordinator::new(gateway.clone(), history.clone());

        let err = coordinator.process_payment(&options()).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert_eq!(gateway.calls(), 1);

        let records = history.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttemptStatus::Cancelled);
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failure() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(EngineError::Timeout),
            Ok(receipt("pay_2")),
        ]));
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = PaymentCoordinator::new(gateway.clone(), history.clone());

        let result = coordinator.process_payment(&options()).await.unwrap();
        assert_eq!(result.payment_id, "pay_2");

        let records = history.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, AttemptStatus::Failed);
        assert_eq!(records[0].error_code.as_deref(), Some("timeout"));
        assert_eq!(records[1].status, AttemptStatus::Success);
        assert_eq!(records[1].attempt_number, 1);
    }

    #[tokio::test]
    async fn test_invalid_configuration_short_circuits() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(receipt("pay_1"))]));
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = PaymentCoordinator::new(gateway.clone(), history.clone());

        let mut bad = options();
        bad.key_id = "".to_string();

        let err = coordinator.process_payment(&bad).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));

        // The gateway was never contacted, so no attempt record exists
        assert_eq!(gateway.calls(), 0);
        assert!(history.is_empty());
        // The flag is released by the guard even on the short-circuit path
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn test_empty_payment_id_counts_as_failure() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(receipt(""))]));
        let history = Arc::new(MemoryHistoryStore::new());
        let coordinator = PaymentCoordinator::new(gateway.clone(), history.clone()).with_policy(
            RetryPolicy {
                max_retries: 0,
                backoff: Duration::from_millis(1),
            },
        );

        let err = coordinator.process_payment(&options()).await.unwrap_err();
        assert!(matches!(err, EngineError::Unknown(_)));

        let records = history.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttemptStatus::Failed);
    }
}
