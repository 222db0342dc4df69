//! The cart orchestrator.
//!
//! Sequences optimistic transitions with asynchronous confirmation:
//!
//! 1. dispatch the optimistic action (state is published immediately)
//! 2. set loading and await the confirmation
//! 3. clear loading; on failure record the message and, for item mutations,
//!    dispatch `Undo`
//!
//! Every transition runs to completion under the cart lock, and the lock is
//! never held across an await, so several operations can be in flight at
//! once. They share the undo stack: a later failure may undo an unrelated
//! change that is still pending.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use uuid::Uuid;

use super::confirm::{ConfirmPayload, Confirmation};
use super::mutation::{FailurePolicy, Mutation, Outcome};
use super::store::{self, CartStore};
use crate::cart::types::check_quantity;
use crate::cart::{Cart, CartAction, CartItem, CartMachine, CartSnapshot, CartState, Totals};
use crate::errors::{ItemError, StoreError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct CartOrchestrator {
    machine: CartMachine,
    cart: Mutex<Cart>,
    last_stable: Mutex<CartState>,
    pending: Mutex<HashMap<Uuid, Mutation>>,
    confirmer: Arc<dyn Confirmation>,
    store: Arc<dyn CartStore>,
    tx: watch::Sender<CartState>,
}

impl CartOrchestrator {
    /// Build an orchestrator and restore whatever the store holds.
    ///
    /// A missing, unreadable or malformed slot leaves the cart empty.
    pub fn open(
        machine: CartMachine,
        confirmer: Arc<dyn Confirmation>,
        store: Arc<dyn CartStore>,
    ) -> Self {
        let initial = machine.initial();
        let (tx, _) = watch::channel(initial.state.clone());
        let orchestrator = Self {
            machine,
            last_stable: Mutex::new(initial.state.clone()),
            cart: Mutex::new(initial),
            pending: Mutex::new(HashMap::new()),
            confirmer,
            store,
            tx,
        };

        match orchestrator.store.load() {
            Ok(Some(blob)) => match store::decode(&blob) {
                Ok(mut saved) => {
                    tracing::debug!(items = saved.state.items.len(), "restored saved cart");
                    // Nothing is in flight in a fresh session.
                    saved.state.is_loading = false;
                    let stable = saved.state.clone();
                    orchestrator.dispatch(CartAction::LoadCart(Box::new(saved)));
                    *lock(&orchestrator.last_stable) = stable;
                }
                Err(e) => tracing::warn!(error = %e, "ignoring saved cart"),
            },
            Ok(None) => tracing::debug!("no saved cart"),
            Err(e) => tracing::warn!(error = %e, "could not read saved cart"),
        }

        orchestrator
    }

    /// Apply one action, persist and publish the result.
    pub fn dispatch(&self, action: CartAction) -> CartState {
        self.apply(action).1
    }

    fn apply(&self, action: CartAction) -> (CartSnapshot, CartState) {
        let name = action.name();
        let mut cart = lock(&self.cart);
        let previous = cart.state.snapshot();
        *cart = self.machine.transition(&cart, action);
        tracing::debug!(
            action = name,
            items = cart.state.items.len(),
            total = %cart.state.totals.total,
            undo_depth = cart.undo_stack.len(),
            "cart transition"
        );

        self.persist(&cart);
        if cart.state.is_stable() {
            *lock(&self.last_stable) = cart.state.clone();
        }
        self.tx.send_replace(cart.state.clone());
        (previous, cart.state.clone())
    }

    fn persist(&self, cart: &Cart) {
        let result = store::encode(cart).and_then(|blob| self.store.save(&blob));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist cart");
        }
    }

    /// Optimistically apply `action`, confirm `payload`, recover on failure.
    async fn mutate(
        &self,
        action: CartAction,
        payload: ConfirmPayload,
        policy: FailurePolicy,
    ) -> Outcome {
        let mut mutation = Mutation::new(policy);
        let (previous, _) = self.apply(action.clone());
        mutation.begin(action, previous);
        // The registry holds the pending copy; it is removed once settled.
        lock(&self.pending).insert(mutation.id, mutation.clone());

        self.apply(CartAction::SetLoading(true));
        let result = self.confirmer.confirm(payload).await;
        self.apply(CartAction::SetLoading(false));

        let failure = match result {
            Ok(_) => None,
            Err(e) => {
                self.apply(CartAction::SetErrors(vec![e.message.clone()]));
                if policy == FailurePolicy::Rollback {
                    tracing::warn!(error = %e, "confirmation failed, rolling back");
                    self.apply(CartAction::Undo);
                } else {
                    tracing::warn!(error = %e, "confirmation failed, keeping change");
                }
                Some(e.message)
            }
        };

        lock(&self.pending).remove(&mutation.id);
        let outcome = Outcome::resolve(policy, failure);
        mutation.settle(outcome.clone());
        tracing::debug!(id = %mutation.id, ?outcome, "mutation settled");
        outcome
    }

    /// Record `error` without touching items or history.
    fn reject(&self, error: ItemError) -> Outcome {
        let message = error.to_string();
        tracing::warn!(error = %message, "mutation rejected");
        self.dispatch(CartAction::SetErrors(vec![message.clone()]));
        Outcome::Rejected(message)
    }

    /// An item whose merged quantity would exceed the line limit is rejected
    /// before anything is applied or confirmed.
    pub async fn add_to_cart(&self, item: CartItem) -> Outcome {
        let check = item
            .validate()
            .and_then(|()| self.state().quantity_after_add(&item));
        if let Err(e) = check {
            return self.reject(e);
        }
        let payload = ConfirmPayload::AddItem { item: item.clone() };
        self.mutate(CartAction::AddItem(item), payload, FailurePolicy::Rollback)
            .await
    }

    pub async fn remove_item(&self, id: &str) -> Outcome {
        let payload = ConfirmPayload::RemoveItem { id: id.to_string() };
        self.mutate(
            CartAction::RemoveItem(id.to_string()),
            payload,
            FailurePolicy::Rollback,
        )
        .await
    }

    /// Quantities below one are ignored without a confirmation round-trip;
    /// quantities above the line limit are rejected.
    pub async fn update_quantity(&self, id: &str, quantity: u32) -> Outcome {
        if quantity < 1 {
            return Outcome::Skipped;
        }
        if let Err(e) = check_quantity(id, quantity) {
            return self.reject(e);
        }
        let payload = ConfirmPayload::UpdateQuantity {
            id: id.to_string(),
            quantity,
        };
        let action = CartAction::UpdateQuantity {
            id: id.to_string(),
            quantity,
        };
        self.mutate(action, payload, FailurePolicy::Rollback).await
    }

    /// A failed confirmation keeps the discount and only reports the error.
    pub async fn apply_discount(&self, code: &str) -> Outcome {
        let payload = ConfirmPayload::ApplyDiscount {
            code: code.to_string(),
        };
        self.mutate(
            CartAction::ApplyDiscount(code.to_string()),
            payload,
            FailurePolicy::Keep,
        )
        .await
    }

    pub fn undo(&self) -> CartState {
        self.dispatch(CartAction::Undo)
    }

    pub fn clear_errors(&self) -> CartState {
        self.dispatch(CartAction::ClearErrors)
    }

    /// Finish the demo checkout: returns the charged totals and empties the
    /// cart, or `None` if the cart is empty or a confirmation is in flight.
    pub fn checkout(&self) -> Option<Totals> {
        let state = self.state();
        if state.is_empty() || state.is_loading {
            return None;
        }
        tracing::info!(total = %state.totals.total, "checkout");
        self.dispatch(CartAction::LoadCart(Box::new(self.machine.initial())));
        Some(state.totals)
    }

    /// Empty the cart and its history.
    pub fn reset(&self) -> Result<CartState, StoreError> {
        let state = self.dispatch(CartAction::LoadCart(Box::new(self.machine.initial())));
        self.store.clear()?;
        Ok(state)
    }

    pub fn state(&self) -> CartState {
        lock(&self.cart).state.clone()
    }

    /// The full aggregate including undo history.
    pub fn cart(&self) -> Cart {
        lock(&self.cart).clone()
    }

    /// Most recent state with no errors and nothing loading.
    pub fn last_stable(&self) -> CartState {
        lock(&self.last_stable).clone()
    }

    /// Mutations still awaiting confirmation.
    pub fn pending(&self) -> Vec<Mutation> {
        lock(&self.pending).values().cloned().collect()
    }

    /// Receive every published state.
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.tx.subscribe()
    }

    /// Write the final cart and drop the orchestrator.
    pub fn close(self) -> Result<(), StoreError> {
        let cart = lock(&self.cart).clone();
        let blob = store::encode(&cart)?;
        self.store.save(&blob)
    }
}
