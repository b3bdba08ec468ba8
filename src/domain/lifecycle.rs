//! Draft -> Published -> Archived lifecycle shared by every directive type.
//!
//! Publishing does not freeze content; only archival does. Archived is
//! terminal and reachable from both Draft and Published.

use crate::domain::errors::DirectiveError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Lifecycle state of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveState {
    #[default]
    Draft,
    Published,
    Archived,
}

impl Display for DirectiveState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        };
        f.write_str(label)
    }
}

/// Finite state machine gating which mutations a directive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectiveLifecycle {
    state: DirectiveState,
}

impl DirectiveLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DirectiveState {
        self.state
    }

    pub fn is_mutable(&self) -> bool {
        self.state != DirectiveState::Archived
    }

    /// Draft -> Published. Only a draft may be published.
    pub fn publish(&mut self) -> Result<(), DirectiveError> {
        match self.state {
            DirectiveState::Draft => {
                self.state = DirectiveState::Published;
                Ok(())
            }
            from => Err(DirectiveError::InvalidStateTransition {
                from,
                action: "publish",
            }),
        }
    }

    /// Draft|Published -> Archived.
    pub fn archive(&mut self) -> Result<(), DirectiveError> {
        match self.state {
            DirectiveState::Archived => Err(DirectiveError::InvalidStateTransition {
                from: DirectiveState::Archived,
                action: "archive",
            }),
            _ => {
                self.state = DirectiveState::Archived;
                Ok(())
            }
        }
    }

    /// Guard for every structural mutation.
    pub fn assert_mutable(&self, id: &str) -> Result<(), DirectiveError> {
        if self.is_mutable() {
            Ok(())
        } else {
            Err(DirectiveError::DirectiveArchived { id: id.to_string() })
        }
    }
}

impl From<DirectiveState> for DirectiveLifecycle {
    fn from(state: DirectiveState) -> Self {
        Self { state }
    }
}
