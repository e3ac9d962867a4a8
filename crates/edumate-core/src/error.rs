//! Store and domain error types.
//!
//! Operations return `anyhow::Result`; these are the typed errors inside it,
//! so callers can downcast and tell a missing record from a refused request
//! without string matching.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a [`Store`](crate::traits::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id exists.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// The write conflicts with an existing record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed (network, auth, database).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { entity, id }
    }
}

/// Business-rule refusals.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The student cannot afford the reward.
    #[error("insufficient coins: need {needed}, have {available}")]
    InsufficientCoins { needed: i64, available: i64 },

    /// The reward request has already been approved or rejected.
    #[error("reward request {0} is already resolved")]
    AlreadyResolved(Uuid),

    /// The reward is no longer offered.
    #[error("reward {0} is not active")]
    RewardInactive(Uuid),

    /// The test has already been submitted.
    #[error("test {0} is already completed")]
    TestCompleted(Uuid),

    /// Links must pair a student with a parent or teacher.
    #[error("cannot link {from} ({from_role}) with {to} ({to_role})")]
    IncompatibleLink {
        from: Uuid,
        from_role: crate::model::Role,
        to: Uuid,
        to_role: crate::model::Role,
    },

    /// The user does not have the role the operation needs.
    #[error("user {id} is a {actual}, expected a {expected}")]
    WrongRole {
        id: Uuid,
        expected: crate::model::Role,
        actual: crate::model::Role,
    },
}
