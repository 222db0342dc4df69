//! Cart data model.
//!
//! Everything here is a plain value: cloned, compared and serialized as a
//! whole. Money is `rust_decimal::Decimal` so two-place rounding is exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ItemError;

/// Largest quantity a single cart line may hold.
pub const MAX_ITEM_QUANTITY: u32 = 9_999;

/// A line in the cart. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
}

impl CartItem {
    /// Build a validated item.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
        image: impl Into<String>,
    ) -> Result<Self, ItemError> {
        let item = Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
            image: image.into(),
        };
        item.validate()?;
        Ok(item)
    }

    pub fn validate(&self) -> Result<(), ItemError> {
        if self.id.trim().is_empty() {
            return Err(ItemError::EmptyId);
        }
        if self.price < Decimal::ZERO {
            return Err(ItemError::NegativePrice {
                id: self.id.clone(),
                price: self.price,
            });
        }
        if self.quantity == 0 {
            return Err(ItemError::ZeroQuantity {
                id: self.id.clone(),
            });
        }
        check_quantity(&self.id, self.quantity)?;
        Ok(())
    }

    /// `price × quantity`, unrounded.
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Reject quantities above `MAX_ITEM_QUANTITY`.
pub fn check_quantity(id: &str, quantity: u32) -> Result<u32, ItemError> {
    if quantity > MAX_ITEM_QUANTITY {
        return Err(ItemError::QuantityTooLarge {
            id: id.to_string(),
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(quantity)
}

/// Derived money figures. Never set directly; see `pricing::calc_totals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// The renderable cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// Insertion order.
    pub items: Vec<CartItem>,
    pub discount_code: String,
    pub discount_amount: Decimal,
    pub totals: Totals,
    pub is_loading: bool,
    pub errors: Vec<String>,
}

impl CartState {
    pub fn find(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Quantity the line for `item.id` would hold after adding `item`.
    pub fn quantity_after_add(&self, item: &CartItem) -> Result<u32, ItemError> {
        let current = self.find(&item.id).map_or(0, |i| i.quantity);
        let merged = current
            .checked_add(item.quantity)
            .unwrap_or(u32::MAX);
        check_quantity(&item.id, merged)
    }

    /// No active errors and nothing pending.
    pub fn is_stable(&self) -> bool {
        !self.is_loading && self.errors.is_empty()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            discount_code: self.discount_code.clone(),
            discount_amount: self.discount_amount,
            totals: self.totals,
        }
    }

    /// Overwrite the structural fields with a snapshot. Loading flag and
    /// errors are left alone.
    pub fn restore(&mut self, snapshot: CartSnapshot) {
        self.items = snapshot.items;
        self.discount_code = snapshot.discount_code;
        self.discount_amount = snapshot.discount_amount;
        self.totals = snapshot.totals;
    }
}

/// The top-level fields an undo brings back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub discount_code: String,
    pub discount_amount: Decimal,
    pub totals: Totals,
}
