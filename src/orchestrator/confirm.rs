//! Remote confirmation of optimistic cart mutations.
//!
//! The orchestrator only sees the `Confirmation` trait. `SimulatedServer` is
//! the stand-in used by the CLI: it answers after a random delay and fails a
//! configurable fraction of calls.

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::errors::ConfirmError;

/// What gets sent for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConfirmPayload {
    AddItem { item: CartItem },
    RemoveItem { id: String },
    UpdateQuantity { id: String, quantity: u32 },
    ApplyDiscount { code: String },
}

/// Confirms a payload, echoing it back on success.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, payload: ConfirmPayload) -> Result<ConfirmPayload, ConfirmError>;
}

/// Default latency window in milliseconds.
pub const DEFAULT_LATENCY_MS: RangeInclusive<u64> = 300..=800;
/// Default fraction of calls that fail.
pub const DEFAULT_FAILURE_RATE: f64 = 0.15;

/// Simulated server with random latency and random failure.
#[derive(Debug, Clone)]
pub struct SimulatedServer {
    latency_ms: RangeInclusive<u64>,
    failure_rate: f64,
}

impl Default for SimulatedServer {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_MS, DEFAULT_FAILURE_RATE)
    }
}

impl SimulatedServer {
    /// `failure_rate` is clamped to `[0, 1]`; an inverted latency range is swapped.
    pub fn new(latency_ms: RangeInclusive<u64>, failure_rate: f64) -> Self {
        let (lo, hi) = (*latency_ms.start(), *latency_ms.end());
        let latency_ms = if lo <= hi { lo..=hi } else { hi..=lo };
        let failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        Self {
            latency_ms,
            failure_rate,
        }
    }

    /// Always succeeds, no delay.
    pub fn always_ok() -> Self {
        Self::new(0..=0, 0.0)
    }

    /// Always fails, no delay.
    pub fn always_fail() -> Self {
        Self::new(0..=0, 1.0)
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    pub fn latency_ms(&self) -> &RangeInclusive<u64> {
        &self.latency_ms
    }

    fn sample(&self) -> (Duration, bool) {
        let mut rng = rand::rng();
        let delay = rng.random_range(self.latency_ms.clone());
        let fail = rng.random_bool(self.failure_rate);
        (Duration::from_millis(delay), fail)
    }
}

#[async_trait]
impl Confirmation for SimulatedServer {
    async fn confirm(&self, payload: ConfirmPayload) -> Result<ConfirmPayload, ConfirmError> {
        let (delay, fail) = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            tracing::debug!(?payload, "simulated confirmation failure");
            return Err(ConfirmError::network());
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ConfirmPayload {
        ConfirmPayload::RemoveItem {
            id: "p1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_always_ok_echoes_payload() {
        let server = SimulatedServer::always_ok();
        assert_eq!(server.confirm(payload()).await.unwrap(), payload());
    }

    #[tokio::test]
    async fn test_always_fail_returns_network_error() {
        let server = SimulatedServer::always_fail();
        let err = server.confirm(payload()).await.unwrap_err();
        assert_eq!(err.message, "Network error. Please try again.");
    }

    #[tokio::test]
    async fn test_latency_is_applied() {
        let server = SimulatedServer::new(30..=30, 0.0);
        let start = tokio::time::Instant::now();
        server.confirm(payload()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_new_clamps_inputs() {
        let server = SimulatedServer::new(800..=300, 7.0);
        assert_eq!(server.latency_ms(), &(300..=800));
        assert_eq!(server.failure_rate(), 1.0);
        assert_eq!(SimulatedServer::new(0..=0, f64::NAN).failure_rate(), 0.0);
    }

    #[test]
    fn test_defaults_match_demo_server() {
        let server = SimulatedServer::default();
        assert_eq!(server.latency_ms(), &(300..=800));
        assert!((server.failure_rate() - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn test_payload_serializes_with_op_tag() {
        let json = serde_json::to_value(ConfirmPayload::ApplyDiscount {
            code: "SAVE10".into(),
        })
        .unwrap();
        assert_eq!(json["op"], "apply_discount");
        assert_eq!(json["code"], "SAVE10");
    }
}
