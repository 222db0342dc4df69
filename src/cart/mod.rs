//! Cart aggregate: data model, pricing, undo history and the pure state machine.

pub mod catalog;
pub mod history;
pub mod machine;
pub mod pricing;
pub mod types;

pub use catalog::{Product, demo_products, find_product};
pub use history::{DEFAULT_UNDO_LIMIT, UndoStack};
pub use machine::{Cart, CartAction, CartMachine};
pub use pricing::{DiscountKind, DiscountRule, PricingRules, round_money};
pub use types::{CartItem, CartSnapshot, CartState, MAX_ITEM_QUANTITY, Totals};
