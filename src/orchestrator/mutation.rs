//! Lifecycle of one optimistic mutation.
//!
//! ```text
//! Idle ──begin──▶ Pending { action, previous } ──settle──▶ Settled(outcome)
//! ```
//!
//! A mutation is created per orchestrator call. The orchestrator keeps the
//! pending ones in a registry so callers can see what is still in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{CartAction, CartSnapshot};

/// How a confirmed mutation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "message")]
pub enum Outcome {
    Confirmed,
    /// Nothing changed, so nothing was sent for confirmation.
    Skipped,
    /// The change was refused locally and never sent for confirmation.
    Rejected(String),
    /// Confirmation failed and the change was undone.
    RolledBack(String),
    /// Confirmation failed but the change was kept.
    Kept(String),
}

impl Outcome {
    /// Map a confirmation result onto an outcome under `policy`.
    pub fn resolve(policy: FailurePolicy, failure: Option<String>) -> Self {
        match (failure, policy) {
            (None, _) => Self::Confirmed,
            (Some(msg), FailurePolicy::Rollback) => Self::RolledBack(msg),
            (Some(msg), FailurePolicy::Keep) => Self::Kept(msg),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Rejected(msg) | Self::RolledBack(msg) | Self::Kept(msg) => Some(msg),
            Self::Confirmed | Self::Skipped => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Rejected(_) | Self::RolledBack(_) | Self::Kept(_)
        )
    }
}

/// What to do when confirmation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    Rollback,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum MutationPhase {
    Idle,
    Pending {
        action: CartAction,
        previous: CartSnapshot,
    },
    Settled {
        outcome: Outcome,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutation {
    pub id: Uuid,
    pub policy: FailurePolicy,
    pub phase: MutationPhase,
    pub started_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Mutation {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy,
            phase: MutationPhase::Idle,
            started_at: None,
            settled_at: None,
        }
    }

    /// Record the optimistic action and what it replaced. Only valid from `Idle`.
    pub fn begin(&mut self, action: CartAction, previous: CartSnapshot) -> bool {
        if !matches!(self.phase, MutationPhase::Idle) {
            return false;
        }
        self.phase = MutationPhase::Pending { action, previous };
        self.started_at = Some(Utc::now());
        true
    }

    /// Resolve a pending mutation. Only valid from `Pending`.
    pub fn settle(&mut self, outcome: Outcome) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.phase = MutationPhase::Settled { outcome };
        self.settled_at = Some(Utc::now());
        true
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, MutationPhase::Pending { .. })
    }

    pub fn action(&self) -> Option<&CartAction> {
        match &self.phase {
            MutationPhase::Pending { action, .. } => Some(action),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match &self.phase {
            MutationPhase::Settled { outcome } => Some(outcome),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(policy: FailurePolicy) -> Mutation {
        let mut m = Mutation::new(policy);
        assert!(m.begin(CartAction::RemoveItem("p1".into()), CartSnapshot::default()));
        m
    }

    #[test]
    fn test_new_mutation_is_idle() {
        let m = Mutation::new(FailurePolicy::Rollback);
        assert_eq!(m.phase, MutationPhase::Idle);
        assert!(m.started_at.is_none());
        assert!(m.action().is_none());
    }

    #[test]
    fn test_begin_only_from_idle() {
        let mut m = pending(FailurePolicy::Rollback);
        assert!(m.is_pending());
        assert_eq!(m.action(), Some(&CartAction::RemoveItem("p1".into())));
        assert!(!m.begin(CartAction::Undo, CartSnapshot::default()));
    }

    #[test]
    fn test_settle_success() {
        let mut m = pending(FailurePolicy::Rollback);
        assert!(m.settle(Outcome::Confirmed));
        assert_eq!(m.outcome(), Some(&Outcome::Confirmed));
        assert!(m.settled_at.is_some());
        assert!(!m.is_pending());
    }

    #[test]
    fn test_resolve_follows_policy() {
        assert_eq!(
            Outcome::resolve(FailurePolicy::Rollback, Some("down".into())),
            Outcome::RolledBack("down".into())
        );
        let kept = Outcome::resolve(FailurePolicy::Keep, Some("down".into()));
        assert_eq!(kept, Outcome::Kept("down".into()));
        assert!(kept.is_failure());
        assert_eq!(kept.error(), Some("down"));
        assert_eq!(
            Outcome::resolve(FailurePolicy::Keep, None),
            Outcome::Confirmed
        );
        assert!(!Outcome::Skipped.is_failure());
    }

    #[test]
    fn test_rejected_is_a_failure() {
        let rejected = Outcome::Rejected("too many".into());
        assert!(rejected.is_failure());
        assert_eq!(rejected.error(), Some("too many"));
    }

    #[test]
    fn test_settle_twice_is_rejected() {
        let mut m = pending(FailurePolicy::Keep);
        m.settle(Outcome::Confirmed);
        assert!(!m.settle(Outcome::Kept("late".into())));
        assert_eq!(m.outcome(), Some(&Outcome::Confirmed));
    }

    #[test]
    fn test_idle_cannot_settle() {
        let mut m = Mutation::new(FailurePolicy::Rollback);
        assert!(!m.settle(Outcome::Confirmed));
        assert_eq!(m.phase, MutationPhase::Idle);
    }
}
