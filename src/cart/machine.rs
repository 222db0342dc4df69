//! The cart state machine.
//!
//! `CartMachine::transition` maps `(cart, action)` to a new `Cart` and never
//! touches its input. Structural actions (add, remove, quantity, discount)
//! push the prior top-level fields onto the undo stack before applying.
//! A quantity change that would exceed `MAX_ITEM_QUANTITY` leaves items and
//! history alone and only records the error.

use serde::{Deserialize, Serialize};

use super::history::UndoStack;
use super::pricing::PricingRules;
use super::types::{CartItem, CartState, check_quantity};
use crate::errors::ItemError;

/// Everything a caller can ask the machine to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartAction {
    /// Replace the whole cart verbatim.
    LoadCart(Box<Cart>),
    AddItem(CartItem),
    RemoveItem(String),
    UpdateQuantity { id: String, quantity: u32 },
    ApplyDiscount(String),
    ClearErrors,
    Undo,
    SetLoading(bool),
    SetErrors(Vec<String>),
}

impl CartAction {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadCart(_) => "LOAD_CART",
            Self::AddItem(_) => "ADD_ITEM",
            Self::RemoveItem(_) => "REMOVE_ITEM",
            Self::UpdateQuantity { .. } => "UPDATE_QUANTITY",
            Self::ApplyDiscount(_) => "APPLY_DISCOUNT",
            Self::ClearErrors => "CLEAR_ERRORS",
            Self::Undo => "UNDO",
            Self::SetLoading(_) => "SET_LOADING",
            Self::SetErrors(_) => "SET_ERRORS",
        }
    }

    /// Whether the action snapshots prior state for undo.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AddItem(_)
                | Self::RemoveItem(_)
                | Self::UpdateQuantity { .. }
                | Self::ApplyDiscount(_)
        )
    }
}

/// The aggregate: renderable state plus its undo history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(flatten)]
    pub state: CartState,
    #[serde(default)]
    pub undo_stack: UndoStack,
}

impl Cart {
    pub fn empty(undo_limit: usize) -> Self {
        Self {
            state: CartState::default(),
            undo_stack: UndoStack::with_limit(undo_limit),
        }
    }
}

/// Pure transition function parameterized by pricing rules and undo depth.
#[derive(Debug, Clone, Default)]
pub struct CartMachine {
    pricing: PricingRules,
    undo_limit: Option<usize>,
}

impl CartMachine {
    pub fn new(pricing: PricingRules, undo_limit: usize) -> Self {
        Self {
            pricing,
            undo_limit: Some(undo_limit),
        }
    }

    pub fn pricing(&self) -> &PricingRules {
        &self.pricing
    }

    /// The cart a fresh session starts from.
    pub fn initial(&self) -> Cart {
        match self.undo_limit {
            Some(limit) => Cart::empty(limit),
            None => Cart::default(),
        }
    }

    pub fn transition(&self, cart: &Cart, action: CartAction) -> Cart {
        match action {
            CartAction::LoadCart(loaded) => {
                let mut loaded = *loaded;
                if let Some(limit) = self.undo_limit {
                    loaded.undo_stack.set_limit(limit);
                }
                loaded
            }

            CartAction::AddItem(item) => {
                let merged = match cart.state.quantity_after_add(&item) {
                    Ok(merged) => merged,
                    Err(e) => return Self::rejected(cart, e),
                };
                self.structural(cart, |state| {
                    match state.items.iter_mut().find(|i| i.id == item.id) {
                        Some(existing) => existing.quantity = merged,
                        None => state.items.push(item),
                    }
                    state.errors.clear();
                })
            }

            CartAction::RemoveItem(id) => self.structural(cart, |state| {
                state.items.retain(|i| i.id != id);
                state.errors.clear();
            }),

            CartAction::UpdateQuantity { id, quantity } => {
                if quantity < 1 {
                    return cart.clone();
                }
                if let Err(e) = check_quantity(&id, quantity) {
                    return Self::rejected(cart, e);
                }
                self.structural(cart, |state| {
                    for item in state.items.iter_mut().filter(|i| i.id == id) {
                        item.quantity = quantity;
                    }
                    state.errors.clear();
                })
            }

            CartAction::ApplyDiscount(code) => {
                let outcome = self.pricing.evaluate_discount(&code, &cart.state.items);
                self.structural(cart, |state| {
                    state.discount_code = outcome.code;
                    state.discount_amount = outcome.amount;
                    state.errors = outcome.error.into_iter().collect();
                })
            }

            CartAction::ClearErrors => {
                let mut next = cart.clone();
                next.state.errors.clear();
                next
            }

            CartAction::Undo => {
                let mut next = cart.clone();
                if let Some(snapshot) = next.undo_stack.pop() {
                    next.state.restore(snapshot);
                }
                next
            }

            CartAction::SetLoading(loading) => {
                let mut next = cart.clone();
                next.state.is_loading = loading;
                next
            }

            CartAction::SetErrors(errors) => {
                let mut next = cart.clone();
                next.state.errors = errors;
                next
            }
        }
    }

    fn rejected(cart: &Cart, error: ItemError) -> Cart {
        let mut next = cart.clone();
        next.state.errors = vec![error.to_string()];
        next
    }

    /// Snapshot, apply `edit`, then recompute totals.
    fn structural(&self, cart: &Cart, edit: impl FnOnce(&mut CartState)) -> Cart {
        let mut next = cart.clone();
        next.undo_stack.push(cart.state.snapshot());
        edit(&mut next.state);
        next.state.totals = self
            .pricing
            .calc_totals(&next.state.items, next.state.discount_amount);
        next
    }
}
