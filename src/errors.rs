//! Typed error hierarchy for cartkit.
//!
//! Three enums cover the three failure surfaces:
//! - `ItemError`: rejected cart item fields
//! - `StoreError`: persistence slot read/write failures
//! - `ConfirmError`: remote confirmation rejections
//!
//! None of these are fatal to a cart. The orchestrator turns them into
//! user-facing strings in `CartState::errors` or into log lines.

use rust_decimal::Decimal;
use thiserror::Error;

/// Message used by the simulated server when a confirmation fails.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Errors from constructing a cart item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("Item id must not be empty")]
    EmptyId,

    #[error("Price {price} for item {id} must not be negative")]
    NegativePrice { id: String, price: Decimal },

    #[error("Quantity for item {id} must be at least 1")]
    ZeroQuantity { id: String },

    #[error("Quantity for item {id} cannot exceed {max}")]
    QuantityTooLarge { id: String, max: u32 },

    #[error("Unknown product {0}")]
    UnknownProduct(String),
}

/// Errors from the persistence slot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read cart slot at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cart slot at {path}: {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cart slot contains malformed data: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Failed to serialize cart: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Cart slot lock poisoned")]
    LockPoisoned,
}

/// A rejected remote confirmation.
///
/// The message is shown to the user verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConfirmError {
    pub message: String,
}

impl ConfirmError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The generic network failure the simulated server reports.
    pub fn network() -> Self {
        Self::new(NETWORK_ERROR_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_error_negative_price_carries_fields() {
        let err = ItemError::NegativePrice {
            id: "p1".to_string(),
            price: Decimal::new(-100, 2),
        };
        match &err {
            ItemError::NegativePrice { id, price } => {
                assert_eq!(id, "p1");
                assert_eq!(*price, Decimal::new(-100, 2));
            }
            _ => panic!("Expected NegativePrice"),
        }
        assert!(err.to_string().contains("-1.00"));
    }

    #[test]
    fn store_error_read_failed_carries_path() {
        use std::path::PathBuf;
        let path = PathBuf::from("/cart/cartState.json");
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StoreError::ReadFailed {
            path: path.clone(),
            source: io_err,
        };
        match &err {
            StoreError::ReadFailed { path: p, source: s } => {
                assert_eq!(p, &path);
                assert_eq!(s.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected ReadFailed"),
        }
    }

    #[test]
    fn confirm_error_displays_message_verbatim() {
        let err = ConfirmError::network();
        assert_eq!(err.to_string(), "Network error. Please try again.");
        assert_eq!(ConfirmError::new("boom").to_string(), "boom");
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ItemError::EmptyId);
        assert_std_error(&StoreError::LockPoisoned);
        assert_std_error(&ConfirmError::network());
    }
}
