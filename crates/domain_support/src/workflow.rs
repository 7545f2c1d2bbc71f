//! Role-gated status transitions

use core_kernel::{Actor, Role};

use crate::error::SupportError;

/// One allowed move between two statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
    pub min_role: Role,
}

impl<S> Transition<S> {
    pub const fn new(from: S, to: S, min_role: Role) -> Self {
        Self { from, to, min_role }
    }
}

/// A status type with a transition table
pub trait Workflow: Copy + PartialEq + 'static {
    fn transitions() -> &'static [Transition<Self>];

    /// Minimum role for `from → to`, or `None` when the move is not allowed
    fn min_role(from: Self, to: Self) -> Option<Role> {
        Self::transitions()
            .iter()
            .find(|t| t.from == from && t.to == to)
            .map(|t| t.min_role)
    }
}

/// Checks that `actor` may move a record from `from` to `to`
///
/// Unknown moves are a validation failure; known moves above the actor's
/// role are forbidden.
pub fn authorize_transition<S: Workflow>(actor: &Actor, from: S, to: S) -> Result<(), SupportError> {
    let min_role = S::min_role(from, to)
        .ok_or_else(|| SupportError::Validation("Invalid status transition".to_string()))?;
    actor.require(min_role)?;
    Ok(())
}
