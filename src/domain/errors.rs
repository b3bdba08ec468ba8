//! Error types for the directive domain.

use crate::domain::lifecycle::DirectiveState;
use std::fmt::{Display, Formatter};

/// Errors raised by directive operations.
///
/// Every failed operation leaves the caller holding an aggregate that must
/// be discarded and reloaded; nothing is rolled back in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    /// Lifecycle transition not allowed from the current state.
    InvalidStateTransition {
        from: DirectiveState,
        action: &'static str,
    },
    /// Structural mutation attempted on an archived directive.
    DirectiveArchived { id: String },
    /// Step id does not belong to the target workflow.
    ForeignStepReference { step_id: String },
    /// Example id does not belong to the target workflow.
    ForeignExampleReference { example_id: String },
    /// Empty or over-length text, or a malformed identifier.
    Validation {
        field: &'static str,
        message: String,
    },
    /// A step list that is not a dense permutation of 1..N.
    InconsistentSequence { message: String },
    /// Command executed on an aggregate that was never drafted.
    NotInitialized,
    /// Draft requested for an aggregate that already exists.
    AlreadyDrafted { id: String },
    /// Storage/persistence failure.
    StorageFailure { message: String },
    /// Optimistic lock failure (concurrent modification detected).
    ConcurrencyConflict { message: String },
}

impl DirectiveError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl Display for DirectiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStateTransition { from, action } => {
                write!(f, "invalid state transition: cannot {} a {} directive", action, from)
            }
            Self::DirectiveArchived { id } => {
                write!(f, "directive '{}' is archived and cannot be modified", id)
            }
            Self::ForeignStepReference { step_id } => {
                write!(f, "step '{}' does not belong to this workflow", step_id)
            }
            Self::ForeignExampleReference { example_id } => {
                write!(f, "example '{}' does not belong to this workflow", example_id)
            }
            Self::Validation { field, message } => write!(f, "invalid {}: {}", field, message),
            Self::InconsistentSequence { message } => {
                write!(f, "inconsistent step sequence: {}", message)
            }
            Self::NotInitialized => write!(f, "workflow not initialized"),
            Self::AlreadyDrafted { id } => write!(f, "workflow '{}' already exists", id),
            Self::StorageFailure { message } => write!(f, "storage failure: {}", message),
            Self::ConcurrencyConflict { message } => write!(f, "concurrency conflict: {}", message),
        }
    }
}

impl std::error::Error for DirectiveError {}
