//! # Payment History
//!
//! The durable audit trail. One `PaymentAttempt` is recorded per gateway
//! invocation, immutable once written; the log is append-only and never
//! mutated or deleted by the engine.

use crate::error::EngineResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Terminal status of a single gateway invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Success,
    Failed,
    Cancelled,
}

/// Audit record for one gateway invocation. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAttempt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    pub status: AttemptStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// Zero-based position within one orchestrated retry sequence
    pub attempt_number: u32,
}

impl PaymentAttempt {
    pub fn succeeded(
        gateway_order_id: impl Into<String>,
        payment_id: impl Into<String>,
        attempt_number: u32,
    ) -> Self {
        Self {
            gateway_order_id: Some(gateway_order_id.into()),
            payment_id: Some(payment_id.into()),
            status: AttemptStatus::Success,
            error_code: None,
            timestamp: Utc::now(),
            attempt_number,
        }
    }

    pub fn failed(
        gateway_order_id: impl Into<String>,
        error_code: impl Into<String>,
        attempt_number: u32,
    ) -> Self {
        Self {
            gateway_order_id: Some(gateway_order_id.into()),
            payment_id: None,
            status: AttemptStatus::Failed,
            error_code: Some(error_code.into()),
            timestamp: Utc::now(),
            attempt_number,
        }
    }

    pub fn cancelled(gateway_order_id: impl Into<String>, attempt_number: u32) -> Self {
        Self {
            gateway_order_id: Some(gateway_order_id.into()),
            payment_id: None,
            status: AttemptStatus::Cancelled,
            error_code: Some("cancelled".to_string()),
            timestamp: Utc::now(),
            attempt_number,
        }
    }
}

/// Append-only persistence for payment attempts.
///
/// The engine only writes; reads exist for diagnostics surfaces, not for
/// business logic.
pub trait HistoryStore: Send + Sync {
    fn append(&self, attempt: PaymentAttempt) -> EngineResult<()>;

    /// Diagnostics read-back
    fn records(&self) -> EngineResult<Vec<PaymentAttempt>>;
}

/// Type alias for a shared history store
pub type BoxedHistoryStore = Arc<dyn HistoryStore>;

/// In-memory store, used by tests and as a fallback when no file path is
/// configured.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<PaymentAttempt>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PaymentAttempt>> {
        // A poisoned lock only means a panicking test thread; the data is
        // still a valid Vec.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, attempt: PaymentAttempt) -> EngineResult<()> {
        self.lock().push(attempt);
        Ok(())
    }

    fn records(&self) -> EngineResult<Vec<PaymentAttempt>> {
        Ok(self.lock().clone())
    }
}
